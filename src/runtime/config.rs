//! Gateway configuration.

use crate::error::GatewayError;
use crate::function::SignatureType;

/// Configuration consumed by the gateway core. The loading mechanism is a
/// collaborator; this struct only carries the values.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Name of the target export to invoke.
    pub target: String,
    /// Source path of the module defining the target.
    pub source: String,
    /// Declared signature type; unset means infer from the callable shape.
    pub signature_type: Option<SignatureType>,
    /// When set, error responses carry the failure detail instead of a
    /// generic message.
    pub debug: bool,
    /// Whether to serve the health check path.
    pub enable_health: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Acknowledgement body for successful event invocations. Event handler
    /// return values are never forwarded to the wire.
    pub ack_body: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            target: "function".to_string(),
            source: "main".to_string(),
            signature_type: None,
            debug: false,
            enable_health: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
            ack_body: "OK".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the configuration from the environment.
    ///
    /// `FUNCTION_TARGET` is required; `FUNCTION_SOURCE` defaults to
    /// `main`; `FUNCTION_SIGNATURE_TYPE` is optional and must be one of
    /// `http`, `event`, `cloudevent` when set.
    pub fn from_env() -> Result<Self, GatewayError> {
        let mut config = Self::default();
        config.target = std::env::var("FUNCTION_TARGET").map_err(|_| {
            GatewayError::InvalidConfiguration(
                "Target is not specified (FUNCTION_TARGET environment variable not set)"
                    .to_string(),
            )
        })?;
        if let Ok(source) = std::env::var("FUNCTION_SOURCE") {
            config.source = source;
        }
        if let Ok(signature) = std::env::var("FUNCTION_SIGNATURE_TYPE") {
            config.signature_type = Some(signature.parse()?);
        }
        if let Ok(host) = std::env::var("HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.port = port.parse().map_err(|_| {
                GatewayError::InvalidConfiguration(format!("invalid PORT value \"{}\"", port))
            })?;
        }
        Ok(config)
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the target export name.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Set the source path.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Declare the signature type instead of inferring it.
    pub fn signature_type(mut self, signature_type: SignatureType) -> Self {
        self.signature_type = Some(signature_type);
        self
    }

    /// Enable or disable debug error bodies.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.source, "main");
        assert_eq!(config.ack_body, "OK");
        assert!(config.signature_type.is_none());
    }

    #[test]
    fn test_builder() {
        let config = GatewayConfig::new()
            .host("127.0.0.1")
            .port(9000)
            .target("handle")
            .source("app")
            .signature_type(SignatureType::CloudEvent)
            .debug(true);
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.target, "handle");
        assert_eq!(config.source, "app");
        assert_eq!(config.signature_type, Some(SignatureType::CloudEvent));
        assert!(config.debug);
    }
}
