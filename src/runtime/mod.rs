//! The gateway runtime: configuration, per-request dispatch and the HTTP
//! server front-end.

mod config;
mod dispatcher;
mod server;

pub use config::GatewayConfig;
pub use dispatcher::Dispatcher;
pub use server::GatewayServer;
