use anyhow::{Context, Result, anyhow};
use tracing::info;

use super::KeyStore;

/// Parameter Store backend for the Falcon client id and secret.
///
/// Each value lives in its own parameter (`SSM_CLIENT_NAME`, `SSM_SECRET_NAME`).
/// Both are read with decryption, so `SecureString` parameters work when the
/// function role can use the KMS key behind them.
pub struct SsmKeyStore {
    client: aws_sdk_ssm::Client,
}

impl SsmKeyStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

#[async_trait::async_trait]
impl KeyStore for SsmKeyStore {
    async fn get(&self, reference: &str) -> Result<String> {
        info!(parameter = reference, "Retrieving Falcon API key parameter");
        let resp = self
            .client
            .get_parameter()
            .name(reference)
            .with_decryption(true)
            .send()
            .await
            .with_context(|| format!("Required property {reference} could not be read"))?;

        parameter_value(reference, resp.parameter.and_then(|p| p.value))
    }
}

/// A parameter with no value, or an empty one, cannot hold a Falcon key.
fn parameter_value(reference: &str, value: Option<String>) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("Required property {reference} not found"))
}
