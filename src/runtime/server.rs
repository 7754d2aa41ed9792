//! HTTP server front-end.
//!
//! A thin hyper/tokio layer around the dispatcher: it accepts connections,
//! converts hyper requests into the gateway's request view and writes the
//! dispatcher's response back. The gateway exposes a single logical
//! endpoint; any path reaches the function, apart from a few system paths
//! handled before dispatch.

use crate::http::{GatewayRequest, GatewayResponse, Method, StatusCode};
use crate::runtime::{Dispatcher, GatewayConfig};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// The gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    dispatcher: Arc<Dispatcher>,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Start accepting connections. Each connection is served on its own
    /// task; each request is dispatched independently.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("Function gateway listening on {}", addr);

        let dispatcher = self.dispatcher.clone();
        let config = self.config.clone();

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);

            let dispatcher = dispatcher.clone();
            let config = config.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let dispatcher = dispatcher.clone();
                    let config = config.clone();
                    async move { handle_request(req, dispatcher, config, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

/// Handle one inbound hyper request.
async fn handle_request(
    req: Request<Incoming>,
    dispatcher: Arc<Dispatcher>,
    config: GatewayConfig,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    debug!("Handling request: {} {} from {}", req.method(), path, remote_addr);

    if let Some(response) = system_response(&path, &config) {
        return Ok(build_response(response));
    }

    let request = match convert_request(req, &path, &config).await {
        Ok(request) => request,
        Err(e) => {
            warn!("Failed to read request: {}", e);
            return Ok(build_response(GatewayResponse::error(
                StatusCode::BAD_REQUEST,
                e.to_string(),
            )));
        }
    };

    Ok(build_response(dispatcher.handle(request).await))
}

/// System paths answered before dispatch: the health check and the
/// browser-noise paths that must never reach the function.
fn system_response(path: &str, config: &GatewayConfig) -> Option<GatewayResponse> {
    if config.enable_health && path == "/_health" {
        return Some(GatewayResponse::text("OK"));
    }
    if path == "/robots.txt" || path == "/favicon.ico" {
        return Some(GatewayResponse::not_found("Not Found"));
    }
    None
}

/// Convert a hyper request into the gateway's request view.
async fn convert_request(
    req: Request<Incoming>,
    path: &str,
    config: &GatewayConfig,
) -> Result<GatewayRequest, Box<dyn std::error::Error + Send + Sync>> {
    let mut request = GatewayRequest::new(Method::from(req.method()), path);

    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            request.set_header(name.as_str(), v);
        }
    }

    let body_bytes = req.collect().await?.to_bytes();
    if body_bytes.len() > config.max_body_size {
        return Err("Request body too large".into());
    }
    if !body_bytes.is_empty() {
        request.body = Some(body_bytes);
    }

    Ok(request)
}

/// Build a hyper response from the gateway's response type.
fn build_response(response: GatewayResponse) -> Response<Full<Bytes>> {
    let status = hyper::StatusCode::from_u16(response.status.0).unwrap_or_else(|_| {
        warn!(
            "Invalid status code {}, falling back to 500 Internal Server Error",
            response.status.0
        );
        hyper::StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut builder = Response::builder().status(status);

    for (name, value) in response.headers {
        builder = builder.header(name, value);
    }

    let body = response.body.unwrap_or_default();
    builder.body(Full::new(body)).unwrap()
}
