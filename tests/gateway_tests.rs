//! End-to-end dispatcher tests covering the three calling conventions,
//! the once-only loader and the error taxonomy.

use funcgate::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// HTTP function mirroring the trigger used in the framework's own tests:
/// the request body's "mode" field selects success, a controlled failure
/// response, or an error.
struct ModeFunction;

#[async_trait]
impl HttpHandler for ModeFunction {
    async fn call(&self, request: GatewayRequest) -> Result<GatewayResponse, HandlerError> {
        let mode = request
            .json::<Value>()
            .and_then(|parsed| parsed.ok())
            .and_then(|value| value.get("mode").and_then(|m| m.as_str().map(String::from)))
            .unwrap_or_default();
        match mode.as_str() {
            "SUCCESS" => Ok(GatewayResponse::text("success")),
            "FAILURE" => Ok(GatewayResponse::error(StatusCode::BAD_REQUEST, "failure")),
            _ => Err(HandlerError::new("intentional failure")),
        }
    }
}

/// CloudEvent function that records the event it was invoked with.
struct CaptureCloudEvent {
    seen: Arc<Mutex<Option<CloudEvent>>>,
}

#[async_trait]
impl CloudEventHandler for CaptureCloudEvent {
    async fn call(&self, event: CloudEvent) -> Result<(), HandlerError> {
        *self.seen.lock().unwrap() = Some(event);
        Ok(())
    }
}

/// CloudEvent function that always fails.
struct FailingCloudEvent;

#[async_trait]
impl CloudEventHandler for FailingCloudEvent {
    async fn call(&self, _event: CloudEvent) -> Result<(), HandlerError> {
        Err(HandlerError::new("boom"))
    }
}

/// CloudEvent function that panics.
struct PanickingCloudEvent;

#[async_trait]
impl CloudEventHandler for PanickingCloudEvent {
    async fn call(&self, _event: CloudEvent) -> Result<(), HandlerError> {
        panic!("unexpected");
    }
}

/// Legacy event function that records the pair it was invoked with.
struct CaptureLegacy {
    seen: Arc<Mutex<Option<(Value, LegacyContext)>>>,
}

#[async_trait]
impl EventHandler for CaptureLegacy {
    async fn call(&self, data: Value, context: LegacyContext) -> Result<(), HandlerError> {
        *self.seen.lock().unwrap() = Some((data, context));
        Ok(())
    }
}

fn dispatcher_for(catalog: ModuleCatalog, target: &str) -> Dispatcher {
    let config = GatewayConfig::new().target(target).source("main").debug(true);
    let loader = FunctionLoader::new(
        catalog,
        config.target.clone(),
        config.source.clone(),
        config.signature_type,
    );
    Dispatcher::new(loader, config)
}

fn structured_request(specversion: &str) -> GatewayRequest {
    let body = json!({
        "specversion": specversion,
        "id": "my-id",
        "source": "from-galaxy-far-far-away",
        "type": "cloudevent.greet.you",
        "time": "tomorrow",
        "datacontenttype": "application/json",
        "data": "{\"name\":\"john\"}",
    });
    GatewayRequest::new(Method::Post, "/")
        .header("Content-Type", "application/cloudevents+json")
        .body(body.to_string())
}

#[tokio::test]
async fn test_http_function_executes_success() {
    let catalog = ModuleCatalog::new().register("main", || {
        Ok(Module::new().export_fn("function", Handler::Http(Arc::new(ModeFunction))))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let request = GatewayRequest::new(Method::Post, "/my_path")
        .header("Content-Type", "application/json")
        .body(json!({"mode": "SUCCESS"}).to_string());
    let response = dispatcher.handle(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text_body(), Some("success".to_string()));
}

#[tokio::test]
async fn test_http_function_executes_failure() {
    let catalog = ModuleCatalog::new().register("main", || {
        Ok(Module::new().export_fn("function", Handler::Http(Arc::new(ModeFunction))))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let request = GatewayRequest::new(Method::Get, "/")
        .header("Content-Type", "application/json")
        .body(json!({"mode": "FAILURE"}).to_string());
    let response = dispatcher.handle(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text_body(), Some("failure".to_string()));
}

#[tokio::test]
async fn test_http_function_executes_throw() {
    let catalog = ModuleCatalog::new().register("main", || {
        Ok(Module::new().export_fn("function", Handler::Http(Arc::new(ModeFunction))))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let request = GatewayRequest::new(Method::Put, "/")
        .header("Content-Type", "application/json")
        .body(json!({"mode": "THROW"}).to_string());
    let response = dispatcher.handle(request).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_cloudevent_structured_v10() {
    let seen = Arc::new(Mutex::new(None));
    let inner = seen.clone();
    let catalog = ModuleCatalog::new().register("main", move || {
        Ok(Module::new().export_fn(
            "function",
            Handler::CloudEvent(Arc::new(CaptureCloudEvent { seen: inner.clone() })),
        ))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let response = dispatcher.handle(structured_request("1.0")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text_body(), Some("OK".to_string()));

    let event = seen.lock().unwrap().clone().unwrap();
    assert_eq!(event.specversion, SpecVersion::V10);
    assert_eq!(event.id, "my-id");
    assert_eq!(event.source, "from-galaxy-far-far-away");
    assert_eq!(event.ty, "cloudevent.greet.you");
    assert_eq!(event.time.as_deref(), Some("tomorrow"));
}

#[tokio::test]
async fn test_cloudevent_binary_v10() {
    let seen = Arc::new(Mutex::new(None));
    let inner = seen.clone();
    let catalog = ModuleCatalog::new().register("main", move || {
        Ok(Module::new().export_fn(
            "function",
            Handler::CloudEvent(Arc::new(CaptureCloudEvent { seen: inner.clone() })),
        ))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let request = GatewayRequest::new(Method::Post, "/")
        .header("ce-id", "my-id")
        .header("ce-source", "from-galaxy-far-far-away")
        .header("ce-type", "cloudevent.greet.you")
        .header("ce-specversion", "1.0")
        .header("ce-time", "tomorrow")
        .header("Content-Type", "application/json")
        .body("{\"name\":\"john\"}");
    let response = dispatcher.handle(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text_body(), Some("OK".to_string()));

    let event = seen.lock().unwrap().clone().unwrap();
    assert_eq!(event.specversion, SpecVersion::V10);
    assert_eq!(event.id, "my-id");
    assert_eq!(event.datacontenttype.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_cloudevent_structured_v03() {
    let seen = Arc::new(Mutex::new(None));
    let inner = seen.clone();
    let catalog = ModuleCatalog::new().register("main", move || {
        Ok(Module::new().export_fn(
            "function",
            Handler::CloudEvent(Arc::new(CaptureCloudEvent { seen: inner.clone() })),
        ))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let response = dispatcher.handle(structured_request("0.3")).await;

    assert_eq!(response.status, StatusCode::OK);
    let event = seen.lock().unwrap().clone().unwrap();
    assert_eq!(event.specversion, SpecVersion::V03);
}

#[tokio::test]
async fn test_cloudevent_malformed_request_is_client_error() {
    let catalog = ModuleCatalog::new().register("main", || {
        Ok(Module::new().export_fn(
            "function",
            Handler::CloudEvent(Arc::new(FailingCloudEvent)),
        ))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    // Binary mode but missing ce-id.
    let request = GatewayRequest::new(Method::Post, "/")
        .header("ce-source", "src")
        .header("ce-type", "ty")
        .header("ce-specversion", "1.0");
    let response = dispatcher.handle(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cloudevent_unsupported_specversion_is_client_error() {
    let catalog = ModuleCatalog::new().register("main", || {
        Ok(Module::new().export_fn(
            "function",
            Handler::CloudEvent(Arc::new(FailingCloudEvent)),
        ))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let response = dispatcher.handle(structured_request("9.9")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text_body().unwrap_or_default().contains("9.9"));
}

#[tokio::test]
async fn test_raising_cloudevent_function_is_server_error() {
    let catalog = ModuleCatalog::new().register("main", || {
        Ok(Module::new().export_fn(
            "function",
            Handler::CloudEvent(Arc::new(FailingCloudEvent)),
        ))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let response = dispatcher.handle(structured_request("1.0")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.status.is_success());
}

#[tokio::test]
async fn test_panicking_function_is_contained() {
    let catalog = ModuleCatalog::new().register("main", || {
        Ok(Module::new().export_fn(
            "function",
            Handler::CloudEvent(Arc::new(PanickingCloudEvent)),
        ))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let response = dispatcher.handle(structured_request("1.0")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_event_function_with_legacy_body() {
    let seen = Arc::new(Mutex::new(None));
    let inner = seen.clone();
    let catalog = ModuleCatalog::new().register("main", move || {
        Ok(Module::new().export_fn(
            "function",
            Handler::Event(Arc::new(CaptureLegacy { seen: inner.clone() })),
        ))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let body = json!({
        "context": {
            "eventId": "some-eventId",
            "timestamp": "some-timestamp",
            "eventType": "some-eventType",
            "resource": "some-resource",
        },
        "data": {"value": "some-value"},
    });
    let request = GatewayRequest::new(Method::Post, "/")
        .header("Content-Type", "application/json")
        .body(body.to_string());
    let response = dispatcher.handle(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text_body(), Some("OK".to_string()));

    let (data, context) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(data, json!({"value": "some-value"}));
    assert_eq!(context.event_id, "some-eventId");
    assert_eq!(context.event_type, "some-eventType");
    assert_eq!(context.timestamp.as_deref(), Some("some-timestamp"));
}

#[tokio::test]
async fn test_event_function_with_cloudevent_request() {
    let seen = Arc::new(Mutex::new(None));
    let inner = seen.clone();
    let catalog = ModuleCatalog::new().register("main", move || {
        Ok(Module::new().export_fn(
            "function",
            Handler::Event(Arc::new(CaptureLegacy { seen: inner.clone() })),
        ))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let response = dispatcher.handle(structured_request("1.0")).await;

    assert_eq!(response.status, StatusCode::OK);
    let (data, context) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(data, Value::String("{\"name\":\"john\"}".to_string()));
    assert_eq!(context.event_id, "my-id");
    assert_eq!(context.event_type, "cloudevent.greet.you");
}

#[tokio::test]
async fn test_event_function_with_malformed_body_is_client_error() {
    let catalog = ModuleCatalog::new().register("main", || {
        Ok(Module::new().export_fn(
            "function",
            Handler::Event(Arc::new(CaptureLegacy {
                seen: Arc::new(Mutex::new(None)),
            })),
        ))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let request = GatewayRequest::new(Method::Post, "/")
        .header("Content-Type", "application/json")
        .body("not json");
    let response = dispatcher.handle(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_module_is_server_error_and_imported_once() {
    let imports = Arc::new(AtomicUsize::new(0));
    let counter = imports.clone();
    // The registered module counts imports; the loader points elsewhere.
    let catalog = ModuleCatalog::new().register("other", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Module::new())
    });
    let dispatcher = dispatcher_for(catalog, "function");

    for _ in 0..3 {
        let response = dispatcher.handle(GatewayRequest::default()).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
    assert_eq!(imports.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failing_import_is_cached_and_never_retried() {
    let imports = Arc::new(AtomicUsize::new(0));
    let counter = imports.clone();
    let catalog = ModuleCatalog::new().register("main", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(GatewayError::ModuleLoad("init raised".to_string()))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    for _ in 0..3 {
        let response = dispatcher.handle(GatewayRequest::default()).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
    assert_eq!(imports.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_first_requests_import_once() {
    let imports = Arc::new(AtomicUsize::new(0));
    let counter = imports.clone();
    let catalog = ModuleCatalog::new().register("main", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Module::new().export_fn("function", Handler::Http(Arc::new(ModeFunction))))
    });
    let dispatcher = Arc::new(dispatcher_for(catalog, "function"));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let dispatcher = dispatcher.clone();
        tasks.push(tokio::spawn(async move {
            let request = GatewayRequest::new(Method::Post, "/")
                .header("Content-Type", "application/json")
                .body(json!({"mode": "SUCCESS"}).to_string());
            dispatcher.handle(request).await
        }));
    }
    for task in tasks {
        let response = task.await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }
    assert_eq!(imports.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_target_is_server_error() {
    let catalog = ModuleCatalog::new().register("main", || Ok(Module::new()));
    let dispatcher = dispatcher_for(catalog, "function");

    let response = dispatcher.handle(GatewayRequest::default()).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_non_callable_target_is_server_error() {
    let catalog = ModuleCatalog::new().register("main", || {
        Ok(Module::new().export_value("function", json!({"not": "callable"})))
    });
    let dispatcher = dispatcher_for(catalog, "function");

    let response = dispatcher.handle(GatewayRequest::default()).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_configured_signature_mismatch_is_server_error() {
    let catalog = ModuleCatalog::new().register("main", || {
        Ok(Module::new().export_fn(
            "function",
            Handler::Event(Arc::new(CaptureLegacy {
                seen: Arc::new(Mutex::new(None)),
            })),
        ))
    });
    let config = GatewayConfig::new()
        .target("function")
        .source("main")
        .signature_type(SignatureType::Http)
        .debug(true);
    let loader = FunctionLoader::new(
        catalog,
        config.target.clone(),
        config.source.clone(),
        config.signature_type,
    );
    let dispatcher = Dispatcher::new(loader, config);

    let response = dispatcher.handle(GatewayRequest::default()).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_production_mode_hides_error_detail() {
    let catalog = ModuleCatalog::new().register("main", || {
        Ok(Module::new().export_fn(
            "function",
            Handler::CloudEvent(Arc::new(FailingCloudEvent)),
        ))
    });
    let config = GatewayConfig::new().target("function").source("main");
    let loader = FunctionLoader::new(
        catalog,
        config.target.clone(),
        config.source.clone(),
        config.signature_type,
    );
    let dispatcher = Dispatcher::new(loader, config);

    let response = dispatcher.handle(structured_request("1.0")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.text_body(),
        Some("Internal Server Error".to_string())
    );
}
