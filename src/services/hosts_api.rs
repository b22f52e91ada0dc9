//! Trait and types for the Falcon host directory.

use anyhow::Result;
use serde::Deserialize;

/// A single entry of the `errors` array the Falcon API attaches to responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorDetail {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Result of a `query_devices_by_filter` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostQueryResult {
    pub status_code: u16,
    /// Host ids (AIDs), in the order the API returned them.
    pub resources: Vec<String>,
    pub errors: Vec<ApiErrorDetail>,
}

/// Result of a `perform_action` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HideActionResult {
    pub status_code: u16,
    pub errors: Vec<ApiErrorDetail>,
}

/// Device actions accepted by `devices-actions/v2`. Only hiding is used here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    HideHost,
}

impl DeviceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceAction::HideHost => "hide_host",
        }
    }
}

/// An authenticated Falcon session exposing the two host operations the hide
/// workflow needs.
///
/// Non-2xx responses are *not* errors: they come back as status codes so the
/// caller can classify them. `Err` is reserved for transport and decoding
/// failures.
#[async_trait::async_trait]
pub trait HostsApi: Send + Sync {
    async fn query_devices_by_filter(&self, filter: &str) -> Result<HostQueryResult>;

    async fn perform_action(&self, action: DeviceAction, host_id: &str) -> Result<HideActionResult>;
}
