//! Process configuration, read once from the environment at start-up.

use crate::error::ConfigError;
use crate::falcon::FalconCloud;
use crate::infra::keys::CredentialSource;

pub const USE_SECRET_STORE: &str = "USE_SECRET_STORE";
pub const SECRET_REGION: &str = "SECRET_REGION";
pub const CS_CLOUD: &str = "CS_CLOUD";
pub const SECRET_STORE_NAME: &str = "SECRET_STORE_NAME";
pub const SSM_CLIENT_NAME: &str = "SSM_CLIENT_NAME";
pub const SSM_SECRET_NAME: &str = "SSM_SECRET_NAME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub credential_source: CredentialSource,
    /// Region of the credential backend, not of the instances.
    pub secret_region: String,
    pub cloud: FalconCloud,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let toggle = require(USE_SECRET_STORE)?;
        let secret_region = require(SECRET_REGION)?;
        let cloud = require(CS_CLOUD)?.parse::<FalconCloud>()?;

        let credential_source = match toggle.as_str() {
            "true" => CredentialSource::SecretStore {
                secret_name: require(SECRET_STORE_NAME)?,
            },
            "false" => CredentialSource::ParameterStore {
                client_id_parameter: require(SSM_CLIENT_NAME)?,
                client_secret_parameter: require(SSM_SECRET_NAME)?,
            },
            _ => return Err(ConfigError::InvalidSecretStoreToggle(toggle)),
        };

        Ok(Self {
            credential_source,
            secret_region,
            cloud,
        })
    }
}
