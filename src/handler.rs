//! Invocation boundary: event in, outcome string out, nothing escapes.

use lambda_runtime::LambdaEvent;
use serde::Serialize;
use serde_json::{Value, json};
use std::error::Error;
use tracing::{Instrument, error, info, info_span, warn};

use crate::error::HideError;
use crate::falcon::FalconClient;
use crate::fetch::HttpClient;
use crate::hide::hide_host_for_instance;
use crate::outcome::Outcome;
use crate::services::HostsApi;

/// The one field consumed from an EventBridge "EC2 Instance State-change
/// Notification".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationEvent {
    pub instance_id: String,
}

impl TerminationEvent {
    pub fn from_payload(payload: &Value) -> Result<Self, HideError> {
        payload["detail"]["instance-id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .map(|id| Self {
                instance_id: id.to_string(),
            })
            .ok_or_else(|| HideError::MalformedEvent("missing detail.instance-id".to_string()))
    }
}

/// What the runtime gets back. `outcome` is `None` when the invocation failed;
/// the failure has been logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerOutput {
    pub outcome: Option<String>,
}

/// Lambda entry point: opens a Falcon session for this invocation and runs the
/// hide workflow. Never returns `Err`, so the runtime does not retry.
pub async fn function_handler<C: HttpClient>(
    client: &FalconClient<C>,
    event: LambdaEvent<Value>,
) -> Result<HandlerOutput, lambda_runtime::Error> {
    let span = info_span!("invocation", request_id = %event.context.request_id);
    let session = client.session();
    Ok(process_event(&event.payload, &session).instrument(span).await)
}

/// Runs one event through the workflow, logging the outcome or the failure.
pub async fn process_event<H: HostsApi + ?Sized>(payload: &Value, session: &H) -> HandlerOutput {
    info!(event = %payload, "Received event");

    match run(payload, session).await {
        Ok(outcome) => {
            match &outcome {
                Outcome::AccessDenied(denial) => warn!(status = denial.status_code(), "{outcome}"),
                _ => info!(hidden = outcome.is_hidden(), "{outcome}"),
            }
            HandlerOutput {
                outcome: Some(outcome.to_string()),
            }
        }
        Err(err) => {
            error!(error_type = err.kind(), "{}", failure_record(&err));
            HandlerOutput { outcome: None }
        }
    }
}

async fn run<H: HostsApi + ?Sized>(payload: &Value, session: &H) -> Result<Outcome, HideError> {
    let event = TerminationEvent::from_payload(payload)?;
    info!(instance_id = %event.instance_id, "Hiding Instance ID");
    hide_host_for_instance(&event.instance_id, session).await
}

/// Structured error record: type, message and the chain of causes.
pub fn failure_record(err: &HideError) -> Value {
    let stack: Vec<String> = std::iter::successors(Some(err as &dyn Error), |&e| e.source())
        .map(|e| e.to_string())
        .collect();

    json!({
        "errorType": err.kind(),
        "errorMessage": err.to_string(),
        "stackTrace": stack,
    })
}
