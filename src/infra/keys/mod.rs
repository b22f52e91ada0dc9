//! Falcon API-key management.
//!
//! [`KeyStore`] is the async trait for resolving a reference into its plaintext value.
//! [`SsmKeyStore`] implements it with AWS SSM Parameter Store and
//! [`SecretsManagerStore`] with AWS Secrets Manager.
//! [`resolve_credentials`] turns a [`CredentialSource`] into [`Credentials`].

mod credentials;
mod secrets;
mod ssm;

pub use credentials::{CredentialSource, Credentials, resolve_credentials};
pub use secrets::SecretsManagerStore;
pub use ssm::SsmKeyStore;

use anyhow::Result;
use aws_config::{BehaviorVersion, Region};

/// Resolves a vault reference (an SSM parameter name or a secret id) into a plaintext secret.
#[async_trait::async_trait]
pub trait KeyStore: Send + Sync {
    async fn get(&self, reference: &str) -> Result<String>;
}

/// Builds the store backing `source`, pinned to `region`.
pub async fn connect_store(source: &CredentialSource, region: &str) -> Box<dyn KeyStore> {
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await;

    match source {
        CredentialSource::SecretStore { .. } => Box::new(SecretsManagerStore::new(&config)),
        CredentialSource::ParameterStore { .. } => Box::new(SsmKeyStore::new(&config)),
    }
}
