use thiserror::Error;

/// Failures of a single hide invocation. None of these escape the handler
/// boundary; they are logged and the invocation completes.
#[derive(Debug, Error)]
pub enum HideError {
    /// The hide action was rejected with something other than 202 or 404.
    #[error("Received non-success response {code} while calling API. Error: {message}")]
    RemoteApi { code: i64, message: String },

    /// The directory query returned a status outside 200/401/403.
    #[error("Unexpected status {status} from host query: {detail}")]
    UnexpectedQueryStatus { status: u16, detail: String },

    /// The inbound payload did not carry `detail.instance-id`.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl HideError {
    /// Short type name used in the structured error log record.
    pub fn kind(&self) -> &'static str {
        match self {
            HideError::RemoteApi { .. } => "RemoteApiError",
            HideError::UnexpectedQueryStatus { .. } => "UnexpectedQueryStatus",
            HideError::MalformedEvent(_) => "MalformedEvent",
            HideError::Transport(_) => "TransportError",
        }
    }
}

/// Start-up configuration problems. Fatal before any event is handled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Required environment variable: {0} is not set.")]
    Missing(&'static str),

    #[error("USE_SECRET_STORE must be \"true\" or \"false\", got {0:?}")]
    InvalidSecretStoreToggle(String),

    #[error("Unknown Falcon cloud {0:?}; expected us-1, us-2, eu-1, us-gov-1, us-gov-2 or a base URL")]
    UnknownCloud(String),
}
