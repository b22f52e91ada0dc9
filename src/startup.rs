//! What happens once per process, before the first event is handled.

use anyhow::Result;
use tracing::info;

use crate::config::Settings;
use crate::falcon::FalconClient;
use crate::fetch::HttpClient;
use crate::infra::keys::{KeyStore, resolve_credentials};

/// Resolves the Falcon credentials from `store` and builds the client every
/// invocation of this process shares. Credential backend failures are fatal.
pub async fn bootstrap<C: HttpClient>(
    settings: &Settings,
    store: &dyn KeyStore,
    http: C,
) -> Result<FalconClient<C>> {
    let credentials = resolve_credentials(&settings.credential_source, store).await?;
    info!(cloud = settings.cloud.base_url(), "Falcon client ready");
    Ok(FalconClient::new(http, settings.cloud.base_url(), credentials))
}
