//! CrowdStrike Falcon API access.
//!
//! [`FalconClient`] holds the credentials and endpoint for the whole process;
//! [`FalconSession`] is the per-invocation [`HostsApi`](crate::services::HostsApi)
//! implementation that talks to the host directory.

mod client;
mod cloud;

pub use client::{FalconClient, FalconSession};
pub use cloud::FalconCloud;

/// Sent with every Falcon request.
pub const USER_AGENT: &str = concat!("crowdstrike-cloud-hide-host/", env!("CARGO_PKG_VERSION"));
