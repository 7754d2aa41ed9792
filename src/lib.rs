//! # funcgate - Function Invocation Gateway
//!
//! funcgate exposes a single HTTP endpoint that hosts user-supplied
//! functions written against three calling conventions, without the
//! function author writing any HTTP code:
//!
//! - **http**: the function receives the raw request view and returns a
//!   response that is passed through verbatim.
//! - **event**: the legacy two-argument `(data, context)` convention.
//! - **cloudevent**: the function receives a decoded CloudEvent
//!   (binary-mode or structured-mode, specversions 1.0 and 0.3).
//!
//! Per request the gateway resolves the configured target callable (lazily,
//! exactly once per process), classifies its signature, reconstructs the
//! convention's arguments from the raw request, invokes the callable and
//! translates its outcome into an HTTP response.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use funcgate::prelude::*;
//! use std::sync::Arc;
//!
//! struct Greeter;
//!
//! #[async_trait::async_trait]
//! impl CloudEventHandler for Greeter {
//!     async fn call(&self, event: CloudEvent) -> Result<(), HandlerError> {
//!         tracing::info!("Received event {} from {}", event.id, event.source);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let catalog = ModuleCatalog::new().register("main", || {
//!         Ok(Module::new().export_fn("greet", Handler::CloudEvent(Arc::new(Greeter))))
//!     });
//!
//!     let config = GatewayConfig::new().target("greet").source("main");
//!     let loader = FunctionLoader::new(
//!         catalog,
//!         config.target.clone(),
//!         config.source.clone(),
//!         config.signature_type,
//!     );
//!     let dispatcher = Dispatcher::new(loader, config.clone());
//!     GatewayServer::new(config, dispatcher).run().await
//! }
//! ```

pub mod error;
pub mod event;
pub mod function;
pub mod http;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::error::GatewayError;
    pub use crate::event::{CloudEvent, EventData, LegacyContext, Resource, SpecVersion};
    pub use crate::function::{
        CloudEventHandler, EventHandler, FunctionLoader, Handler, HandlerError, HttpHandler,
        Module, ModuleCatalog, SignatureType,
    };
    pub use crate::http::{GatewayRequest, GatewayResponse, Method, StatusCode};
    pub use crate::runtime::{Dispatcher, GatewayConfig, GatewayServer};
    pub use async_trait::async_trait;
}

pub use error::GatewayError;
pub use event::{CloudEvent, EventData, SpecVersion};
pub use function::{FunctionLoader, Handler, HandlerError, ModuleCatalog, SignatureType};
pub use http::{GatewayRequest, GatewayResponse};
pub use runtime::{Dispatcher, GatewayConfig, GatewayServer};
