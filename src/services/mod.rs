pub mod hosts_api;

pub use hosts_api::{ApiErrorDetail, DeviceAction, HideActionResult, HostQueryResult, HostsApi};
