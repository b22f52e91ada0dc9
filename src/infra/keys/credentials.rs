use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use tracing::info;

use super::KeyStore;

/// Falcon OAuth2 API client credentials.
///
/// The JSON field names match the secret layout stored in Secrets Manager:
/// ```json
/// { "FalconClientId": "...", "FalconSecret": "..." }
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(rename = "FalconClientId")]
    pub client_id: String,
    #[serde(rename = "FalconSecret")]
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Where the credentials live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// One Secrets Manager secret holding both values as JSON.
    SecretStore { secret_name: String },
    /// Two SSM parameters, one per value.
    ParameterStore {
        client_id_parameter: String,
        client_secret_parameter: String,
    },
}

/// Reads the credentials from `store`. Called once, before the runtime loop.
pub async fn resolve_credentials(
    source: &CredentialSource,
    store: &dyn KeyStore,
) -> Result<Credentials> {
    match source {
        CredentialSource::SecretStore { secret_name } => {
            info!("Retrieving API keys from secrets...");
            let raw = store.get(secret_name).await?;
            serde_json::from_str(&raw).with_context(|| {
                format!("Secret '{secret_name}' must be JSON with FalconClientId and FalconSecret")
            })
        }
        CredentialSource::ParameterStore {
            client_id_parameter,
            client_secret_parameter,
        } => {
            info!("Retrieving API keys from parameter store...");
            let client_id = store.get(client_id_parameter).await?;
            let client_secret = store.get(client_secret_parameter).await?;
            Ok(Credentials {
                client_id,
                client_secret,
            })
        }
    }
}
