//! Per-request orchestration.
//!
//! The dispatcher resolves the function descriptor, builds the arguments
//! the classified signature expects, invokes the callable and translates
//! the outcome into an HTTP response. No failure raised anywhere along
//! that path escapes it; every request gets a well-formed response.

use crate::error::GatewayError;
use crate::event::{codec, legacy};
use crate::function::handler::HandlerError;
use crate::function::{FunctionLoader, SignatureType};
use crate::http::{GatewayRequest, GatewayResponse};
use crate::runtime::GatewayConfig;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error};

/// What an invocation produced, before translation.
enum Outcome {
    /// An HTTP handler's response, passed through verbatim.
    Http(GatewayResponse),
    /// A normally returning event or CloudEvent handler. The return value
    /// is discarded; the wire gets a fixed acknowledgement.
    Ack,
}

/// Orchestrates loader, classifier, codec, adapter and invocation for each
/// request.
pub struct Dispatcher {
    loader: Arc<FunctionLoader>,
    config: GatewayConfig,
}

impl Dispatcher {
    pub fn new(loader: FunctionLoader, config: GatewayConfig) -> Self {
        Self {
            loader: Arc::new(loader),
            config,
        }
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: GatewayRequest) -> GatewayResponse {
        match self.dispatch(request).await {
            Ok(outcome) => self.translate(outcome),
            Err(err) => self.error_response(&err),
        }
    }

    async fn dispatch(&self, request: GatewayRequest) -> Result<Outcome, GatewayError> {
        let descriptor = self.loader.resolve().await?;
        let signature = descriptor.signature.clone()?;
        debug!(
            "Dispatching {} {} to \"{}\" as {}",
            request.method, request.path, descriptor.target, signature
        );

        match signature {
            SignatureType::Http => {
                let handler = descriptor
                    .handler
                    .as_http()
                    .ok_or_else(|| shape_mismatch(signature))?;
                let response = invoke(async move { handler.call(request).await }).await?;
                Ok(Outcome::Http(response))
            }
            SignatureType::CloudEvent => {
                let event = codec::decode(&request)?;
                let handler = descriptor
                    .handler
                    .as_cloudevent()
                    .ok_or_else(|| shape_mismatch(signature))?;
                invoke(async move { handler.call(event).await }).await?;
                Ok(Outcome::Ack)
            }
            SignatureType::Event => {
                let event = if codec::carries_cloudevent(&request) {
                    codec::decode(&request)?
                } else {
                    legacy::from_legacy(request.body.as_deref().unwrap_or_default())?
                };
                let (data, context) = legacy::to_legacy(&event);
                let handler = descriptor
                    .handler
                    .as_event()
                    .ok_or_else(|| shape_mismatch(signature))?;
                invoke(async move { handler.call(data, context).await }).await?;
                Ok(Outcome::Ack)
            }
        }
    }

    fn translate(&self, outcome: Outcome) -> GatewayResponse {
        match outcome {
            Outcome::Http(response) => response,
            Outcome::Ack => GatewayResponse::text(self.config.ack_body.clone()),
        }
    }

    fn error_response(&self, err: &GatewayError) -> GatewayResponse {
        error!("Request failed: {}", err);
        let body = if self.config.debug {
            err.to_string()
        } else {
            err.generic_message().to_string()
        };
        GatewayResponse::error(err.status(), body)
    }
}

fn shape_mismatch(signature: SignatureType) -> GatewayError {
    GatewayError::SignatureClassification(format!(
        "resolved callable cannot be invoked as {}",
        signature
    ))
}

/// Run the user callable on its own task so a panic is contained and
/// surfaced as an invocation error instead of taking the worker down.
async fn invoke<T, F>(call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, HandlerError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(GatewayError::Invocation(err.to_string())),
        Err(join_err) if join_err.is_panic() => Err(GatewayError::Invocation(
            "function panicked during invocation".to_string(),
        )),
        Err(_) => Err(GatewayError::Invocation(
            "function invocation was cancelled".to_string(),
        )),
    }
}
