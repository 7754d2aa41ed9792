//! Signature classification.
//!
//! The calling convention a callable expects is decided exactly once per
//! descriptor: an explicitly configured type always wins, otherwise the
//! callable's shape metadata decides. Classification is a pure function;
//! nothing is invoked to classify it.

use crate::error::GatewayError;
use crate::function::handler::Handler;

/// The calling convention a function is invoked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureType {
    Http,
    Event,
    CloudEvent,
}

impl SignatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureType::Http => "http",
            SignatureType::Event => "event",
            SignatureType::CloudEvent => "cloudevent",
        }
    }
}

impl std::fmt::Display for SignatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SignatureType {
    type Err = GatewayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "http" => Ok(SignatureType::Http),
            "event" => Ok(SignatureType::Event),
            "cloudevent" => Ok(SignatureType::CloudEvent),
            other => Err(GatewayError::InvalidConfiguration(format!(
                "unknown signature type \"{}\" (expected http, event or cloudevent)",
                other
            ))),
        }
    }
}

/// Static shape metadata of a callable: how many arguments it takes and,
/// for single-argument callables, which input it was declared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableShape {
    /// One argument: the raw request view.
    UnaryRequest,
    /// One argument: a decoded CloudEvent.
    UnaryEvent,
    /// Two arguments: the legacy `(data, context)` pair.
    Binary,
}

impl CallableShape {
    pub fn of(handler: &Handler) -> Self {
        match handler {
            Handler::Http(_) => CallableShape::UnaryRequest,
            Handler::CloudEvent(_) => CallableShape::UnaryEvent,
            Handler::Event(_) => CallableShape::Binary,
        }
    }
}

/// Decide the signature type for a callable shape.
///
/// A configured type that the shape cannot satisfy is a classification
/// error; it is cached with the descriptor and surfaced on every dispatch.
pub fn classify(
    shape: CallableShape,
    configured: Option<SignatureType>,
) -> Result<SignatureType, GatewayError> {
    let inferred = match shape {
        CallableShape::UnaryRequest => SignatureType::Http,
        CallableShape::UnaryEvent => SignatureType::CloudEvent,
        CallableShape::Binary => SignatureType::Event,
    };
    match configured {
        None => Ok(inferred),
        Some(declared) if declared == inferred => Ok(declared),
        Some(declared) => Err(GatewayError::SignatureClassification(format!(
            "configured signature type \"{}\" does not match the callable shape (expected \"{}\")",
            declared, inferred
        ))),
    }
}
