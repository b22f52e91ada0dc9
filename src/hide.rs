//! Resolve a terminated EC2 instance to its Falcon host and hide it.

use tracing::{info, warn};

use crate::error::HideError;
use crate::outcome::{AccessDenial, Outcome};
use crate::services::{ApiErrorDetail, DeviceAction, HideActionResult, HostQueryResult, HostsApi};

/// Directory filter matching hosts by their cloud instance id.
pub fn instance_filter(instance_id: &str) -> String {
    format!("instance_id:'{instance_id}'")
}

/// What the directory query told us.
#[derive(Debug, PartialEq, Eq)]
enum Resolution {
    Host(String),
    Finished(Outcome),
}

/// Looks up the host registered for `instance_id` and hides it.
///
/// At most one hide action is issued, and only when the query returned 200
/// with at least one resource. Only the first resource is used.
#[tracing::instrument(skip_all, fields(instance_id = %instance_id))]
pub async fn hide_host_for_instance<H: HostsApi + ?Sized>(
    instance_id: &str,
    session: &H,
) -> Result<Outcome, HideError> {
    let query = session
        .query_devices_by_filter(&instance_filter(instance_id))
        .await?;

    let host_id = match classify_query(instance_id, query)? {
        Resolution::Host(host_id) => host_id,
        Resolution::Finished(outcome) => return Ok(outcome),
    };

    info!(host_id = %host_id, "Hiding host");
    let action = session
        .perform_action(DeviceAction::HideHost, &host_id)
        .await?;

    classify_hide(instance_id, host_id, action)
}

fn classify_query(instance_id: &str, query: HostQueryResult) -> Result<Resolution, HideError> {
    match query.status_code {
        401 => Ok(Resolution::Finished(Outcome::AccessDenied(
            AccessDenial::InvalidKey,
        ))),
        403 => Ok(Resolution::Finished(Outcome::AccessDenied(
            AccessDenial::MissingScope,
        ))),
        200 => {
            let mut resources = query.resources.into_iter();
            match resources.next() {
                Some(host_id) => {
                    let ignored = resources.count();
                    if ignored > 0 {
                        warn!(host_id = %host_id, ignored, "Several hosts match instance, using the first");
                    }
                    Ok(Resolution::Host(host_id))
                }
                None => Ok(Resolution::Finished(Outcome::NotFound {
                    instance_id: instance_id.to_string(),
                })),
            }
        }
        status => Err(HideError::UnexpectedQueryStatus {
            status,
            detail: describe_errors(&query.errors),
        }),
    }
}

fn classify_hide(
    instance_id: &str,
    host_id: String,
    action: HideActionResult,
) -> Result<Outcome, HideError> {
    match action.status_code {
        202 => Ok(Outcome::Hidden {
            instance_id: instance_id.to_string(),
            host_id,
        }),
        404 => Ok(Outcome::SensorAbsent {
            instance_id: instance_id.to_string(),
        }),
        status => {
            let (code, message) = match action.errors.into_iter().next() {
                Some(detail) => (detail.code, detail.message),
                None => (i64::from(status), "no error detail returned".to_string()),
            };
            Err(HideError::RemoteApi { code, message })
        }
    }
}

fn describe_errors(errors: &[ApiErrorDetail]) -> String {
    if errors.is_empty() {
        return "no error detail returned".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
