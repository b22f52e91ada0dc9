use anyhow::{Context, Result, anyhow};
use tracing::info;

use super::KeyStore;

/// Resolves secrets from AWS Secrets Manager.
///
/// Text secrets are returned as stored; binary secrets must hold UTF-8.
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_secretsmanager::Client::new(config),
        }
    }
}

#[async_trait::async_trait]
impl KeyStore for SecretsManagerStore {
    async fn get(&self, reference: &str) -> Result<String> {
        info!(secret = reference, "Fetching Secrets Manager secret");
        let resp = self
            .client
            .get_secret_value()
            .secret_id(reference)
            .send()
            .await
            .with_context(|| format!("Secrets Manager GetSecretValue failed for '{reference}'"))?;

        secret_text(
            reference,
            resp.secret_string(),
            resp.secret_binary().map(|b| b.as_ref()),
        )
    }
}

/// `SecretString` wins; otherwise the already-decoded `SecretBinary` bytes.
fn secret_text(reference: &str, text: Option<&str>, binary: Option<&[u8]>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text.to_string());
    }

    let binary = binary.ok_or_else(|| anyhow!("Secret '{reference}' exists but has no value"))?;
    String::from_utf8(binary.to_vec())
        .with_context(|| format!("Secret '{reference}' is not valid UTF-8"))
}
