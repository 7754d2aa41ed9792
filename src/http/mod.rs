//! HTTP request and response views shared by the codec, the dispatcher and
//! user functions.

mod request;
mod response;

pub use request::{GatewayRequest, Method};
pub use response::{GatewayResponse, StatusCode};
