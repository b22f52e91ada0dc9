use std::str::FromStr;

use crate::error::ConfigError;

/// Falcon cloud the tenant lives in, as named by `CS_CLOUD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FalconCloud {
    Us1,
    Us2,
    Eu1,
    UsGov1,
    UsGov2,
    /// Explicit base URL, for proxies and test doubles.
    Custom(String),
}

impl FalconCloud {
    pub fn base_url(&self) -> &str {
        match self {
            FalconCloud::Us1 => "https://api.crowdstrike.com",
            FalconCloud::Us2 => "https://api.us-2.crowdstrike.com",
            FalconCloud::Eu1 => "https://api.eu-1.crowdstrike.com",
            FalconCloud::UsGov1 => "https://api.laggar.gcw.crowdstrike.com",
            FalconCloud::UsGov2 => "https://api.us-gov-2.crowdstrike.mil",
            FalconCloud::Custom(url) => url,
        }
    }
}

impl FromStr for FalconCloud {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "us-1" | "us1" => Ok(FalconCloud::Us1),
            "us-2" | "us2" => Ok(FalconCloud::Us2),
            "eu-1" | "eu1" => Ok(FalconCloud::Eu1),
            "us-gov-1" | "usgov1" => Ok(FalconCloud::UsGov1),
            "us-gov-2" | "usgov2" => Ok(FalconCloud::UsGov2),
            lower if lower.starts_with("https://") || lower.starts_with("http://") => {
                url::Url::parse(trimmed).map_err(|_| ConfigError::UnknownCloud(s.to_string()))?;
                Ok(FalconCloud::Custom(trimmed.trim_end_matches('/').to_string()))
            }
            _ => Err(ConfigError::UnknownCloud(s.to_string())),
        }
    }
}
