//! Handler traits for the three calling conventions.

use crate::event::{CloudEvent, LegacyContext};
use crate::http::{GatewayRequest, GatewayResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A function invoked with the raw request view, producing a response the
/// gateway passes through verbatim.
#[async_trait]
pub trait HttpHandler: Send + Sync {
    async fn call(&self, request: GatewayRequest) -> Result<GatewayResponse, HandlerError>;
}

/// A function invoked with the legacy `(data, context)` pair. Its return
/// value is not forwarded to the wire.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn call(&self, data: Value, context: LegacyContext) -> Result<(), HandlerError>;
}

/// A function invoked with a single decoded CloudEvent. Its return value is
/// not forwarded to the wire.
#[async_trait]
pub trait CloudEventHandler: Send + Sync {
    async fn call(&self, event: CloudEvent) -> Result<(), HandlerError>;
}

/// A resolved callable, tagged by the shape it was written against.
#[derive(Clone)]
pub enum Handler {
    Http(Arc<dyn HttpHandler>),
    Event(Arc<dyn EventHandler>),
    CloudEvent(Arc<dyn CloudEventHandler>),
}

impl Handler {
    pub fn as_http(&self) -> Option<Arc<dyn HttpHandler>> {
        match self {
            Handler::Http(handler) => Some(Arc::clone(handler)),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<Arc<dyn EventHandler>> {
        match self {
            Handler::Event(handler) => Some(Arc::clone(handler)),
            _ => None,
        }
    }

    pub fn as_cloudevent(&self) -> Option<Arc<dyn CloudEventHandler>> {
        match self {
            Handler::CloudEvent(handler) => Some(Arc::clone(handler)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Http(_) => f.write_str("Handler::Http"),
            Handler::Event(_) => f.write_str("Handler::Event"),
            Handler::CloudEvent(_) => f.write_str("Handler::CloudEvent"),
        }
    }
}

/// Error raised by a user function.
#[derive(Debug, Clone)]
pub struct HandlerError {
    /// Error message.
    pub message: String,
}

impl HandlerError {
    /// Create a new HandlerError.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HandlerError {}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        HandlerError::new(err.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::new(err.to_string())
    }
}
