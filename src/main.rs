//! funcgate binary - runs the gateway with a catalog of demo functions.

use funcgate::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// HTTP demo function: greets whoever the JSON body names.
struct HelloFunction;

#[async_trait]
impl HttpHandler for HelloFunction {
    async fn call(&self, request: GatewayRequest) -> Result<GatewayResponse, HandlerError> {
        let name = request
            .json::<serde_json::Value>()
            .and_then(|parsed| parsed.ok())
            .and_then(|value| value.get("name").and_then(|n| n.as_str().map(String::from)))
            .unwrap_or_else(|| "World".to_string());
        Ok(GatewayResponse::text(format!("Hello, {}!", name)))
    }
}

/// Legacy event demo function: logs the pair it was invoked with.
struct LogEventFunction;

#[async_trait]
impl EventHandler for LogEventFunction {
    async fn call(
        &self,
        data: serde_json::Value,
        context: LegacyContext,
    ) -> Result<(), HandlerError> {
        tracing::info!(
            "Legacy event {} ({}) with data: {}",
            context.event_id,
            context.event_type,
            data
        );
        Ok(())
    }
}

/// CloudEvent demo function: logs the event envelope.
struct LogCloudEventFunction;

#[async_trait]
impl CloudEventHandler for LogCloudEventFunction {
    async fn call(&self, event: CloudEvent) -> Result<(), HandlerError> {
        tracing::info!(
            "CloudEvent {} type={} source={} specversion={}",
            event.id,
            event.ty,
            event.source,
            event.specversion
        );
        Ok(())
    }
}

fn demo_catalog() -> ModuleCatalog {
    ModuleCatalog::new().register("main", || {
        Ok(Module::new()
            .export_fn("hello", Handler::Http(Arc::new(HelloFunction)))
            .export_fn("on_event", Handler::Event(Arc::new(LogEventFunction)))
            .export_fn(
                "on_cloudevent",
                Handler::CloudEvent(Arc::new(LogCloudEventFunction)),
            ))
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // FUNCTION_TARGET selects the demo function when set; "hello" otherwise.
    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(GatewayError::InvalidConfiguration(msg))
            if msg.contains("FUNCTION_TARGET") =>
        {
            tracing::warn!("{}; defaulting to target \"hello\"", msg);
            GatewayConfig::new().target("hello")
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(
        "Starting function gateway for target \"{}\" from \"{}\"",
        config.target,
        config.source
    );
    tracing::info!("Try: curl -X POST -d '{{\"name\":\"john\"}}' http://localhost:8080/");

    let loader = FunctionLoader::new(
        demo_catalog(),
        config.target.clone(),
        config.source.clone(),
        config.signature_type,
    );
    let dispatcher = Dispatcher::new(loader, config.clone());

    GatewayServer::new(config, dispatcher).run().await
}
