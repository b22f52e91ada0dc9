//! Classified results of a hide invocation.

use std::fmt;

/// Why the directory query was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenial {
    /// `401`: the API key is not valid.
    InvalidKey,
    /// `403`: the API key lacks the Hosts read/write scope.
    MissingScope,
}

impl AccessDenial {
    pub fn status_code(&self) -> u16 {
        match self {
            AccessDenial::InvalidKey => 401,
            AccessDenial::MissingScope => 403,
        }
    }
}

/// Every non-failing way an invocation can end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Hidden { instance_id: String, host_id: String },
    NotFound { instance_id: String },
    AccessDenied(AccessDenial),
    SensorAbsent { instance_id: String },
}

impl Outcome {
    pub fn is_hidden(&self) -> bool {
        matches!(self, Outcome::Hidden { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Hidden {
                instance_id,
                host_id,
            } => write!(
                f,
                "AWS Instance: {instance_id} | Falcon Resource ID: {host_id} was successfully hidden"
            ),
            Outcome::NotFound { instance_id } => write!(
                f,
                "AWS instance: {instance_id} was not found in your Falcon tenant"
            ),
            Outcome::AccessDenied(AccessDenial::InvalidKey) => write!(
                f,
                "401 Access denied, authorization failed. Please ensure the Falcon API Key is valid."
            ),
            Outcome::AccessDenied(AccessDenial::MissingScope) => write!(
                f,
                "403 Access denied, authorization failed. Please ensure the Falcon API Key has scope: Hosts Read & Write"
            ),
            Outcome::SensorAbsent { instance_id } => write!(
                f,
                "AWS Instance: {instance_id} does not have a sensor installed."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_message() {
        let outcome = Outcome::Hidden {
            instance_id: "i-0123456789abcdef0".to_string(),
            host_id: "aid-1".to_string(),
        };
        assert_eq!(
            outcome.to_string(),
            "AWS Instance: i-0123456789abcdef0 | Falcon Resource ID: aid-1 was successfully hidden"
        );
        assert!(outcome.is_hidden());
    }

    #[test]
    fn test_not_found_message() {
        let outcome = Outcome::NotFound {
            instance_id: "i-0123456789abcdef0".to_string(),
        };
        assert_eq!(
            outcome.to_string(),
            "AWS instance: i-0123456789abcdef0 was not found in your Falcon tenant"
        );
        assert!(!outcome.is_hidden());
    }

    #[test]
    fn test_access_denied_messages_carry_status() {
        let invalid = Outcome::AccessDenied(AccessDenial::InvalidKey).to_string();
        let scope = Outcome::AccessDenied(AccessDenial::MissingScope).to_string();
        assert!(invalid.starts_with("401 "));
        assert!(invalid.contains("API Key is valid"));
        assert!(scope.starts_with("403 "));
        assert!(scope.contains("Hosts Read & Write"));
        assert_eq!(AccessDenial::InvalidKey.status_code(), 401);
        assert_eq!(AccessDenial::MissingScope.status_code(), 403);
    }

    #[test]
    fn test_sensor_absent_message() {
        let outcome = Outcome::SensorAbsent {
            instance_id: "i-abc".to_string(),
        };
        assert_eq!(
            outcome.to_string(),
            "AWS Instance: i-abc does not have a sensor installed."
        );
    }
}
