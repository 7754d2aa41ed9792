//! Gateway error taxonomy.
//!
//! Every failure the gateway can produce is one of these kinds, and every
//! kind maps to a well-formed HTTP response. Load-time failures are cached
//! by the loader and replayed verbatim on every request; decode failures are
//! per-request and never cached.

use crate::http::StatusCode;

/// The failure kinds the gateway distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The configured source module could not be imported. Fatal per
    /// process; cached by the loader.
    ModuleLoad(String),
    /// The named target is missing from the module or is not callable.
    /// Fatal per process; cached by the loader.
    TargetResolution(String),
    /// The callable's shape matches none of the supported signature types,
    /// or contradicts the configured one. Surfaced per request as a server
    /// error.
    SignatureClassification(String),
    /// The inbound request does not carry a well-formed CloudEvent or
    /// legacy event payload. Client error, never cached.
    EventDecode(String),
    /// The user callable failed (returned an error or panicked).
    Invocation(String),
    /// The gateway configuration itself is unusable.
    InvalidConfiguration(String),
}

impl GatewayError {
    /// HTTP status this error translates to.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::EventDecode(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body used when the gateway is not running in debug mode.
    pub fn generic_message(&self) -> &'static str {
        match self {
            GatewayError::EventDecode(_) => "Bad Request",
            _ => "Internal Server Error",
        }
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::ModuleLoad(msg) => write!(f, "module load error: {}", msg),
            GatewayError::TargetResolution(msg) => {
                write!(f, "target resolution error: {}", msg)
            }
            GatewayError::SignatureClassification(msg) => {
                write!(f, "signature classification error: {}", msg)
            }
            GatewayError::EventDecode(msg) => write!(f, "event decode error: {}", msg),
            GatewayError::Invocation(msg) => write!(f, "function invocation error: {}", msg),
            GatewayError::InvalidConfiguration(msg) => {
                write!(f, "invalid configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for GatewayError {}
