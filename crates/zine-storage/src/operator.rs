//! OpenDAL Operator factory for content-addressed gateways

use anyhow::{Context, Result};
use opendal::Operator;
use zine_core::config::GatewayConfig;

/// Build a read-only OpenDAL Operator over an HTTP gateway.
///
/// Objects resolve as `{endpoint}{root}/{content_id}`, so an IPFS gateway is
/// configured with `root = "/ipfs"`.
pub fn build_operator(endpoint: &str, root: &str) -> Result<Operator> {
    // opendal 0.55: builders use consuming pattern (methods take `self`, return `Self`)
    let builder = opendal::services::Http::default()
        .endpoint(endpoint)
        .root(root);

    let op = Operator::new(builder)
        .context("creating OpenDAL HTTP operator")?
        .layer(opendal::layers::LoggingLayer::default())
        .finish();

    Ok(op)
}

/// Build an operator from the `[gateway]` config section.
///
/// If `enforce_tls` is true and the endpoint uses HTTP, this returns an error.
/// Otherwise, a warning is logged for non-HTTPS endpoints.
pub fn build_from_config(gateway: &GatewayConfig) -> Result<Operator> {
    if gateway.endpoint.starts_with("http://") {
        if gateway.enforce_tls {
            anyhow::bail!(
                "gateway endpoint uses plaintext HTTP ({}), but enforce_tls is enabled. \
                 Use an HTTPS endpoint or set gateway.enforce_tls = false for a local node.",
                gateway.endpoint
            );
        }
        tracing::warn!(
            endpoint = %gateway.endpoint,
            "gateway endpoint uses plaintext HTTP. \
             Set gateway.enforce_tls = true and use HTTPS outside a local node."
        );
    }

    build_operator(&gateway.endpoint, &gateway.path_prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_operator_valid() {
        let op = build_operator("http://127.0.0.1:8080", "/ipfs");
        assert!(op.is_ok(), "operator construction should succeed");
    }

    #[test]
    fn test_build_from_config_http_warning() {
        // HTTP endpoint with enforce_tls=false should succeed (but log warning)
        let gateway = GatewayConfig {
            endpoint: "http://127.0.0.1:8080".into(),
            enforce_tls: false,
            ..Default::default()
        };
        assert!(build_from_config(&gateway).is_ok());
    }

    #[test]
    fn test_build_from_config_http_enforce_tls() {
        let gateway = GatewayConfig {
            endpoint: "http://insecure:8080".into(),
            enforce_tls: true,
            ..Default::default()
        };
        let result = build_from_config(&gateway);
        assert!(result.is_err(), "HTTP + enforce_tls must fail");
        assert!(
            result.unwrap_err().to_string().contains("enforce_tls"),
            "error message should mention enforce_tls"
        );
    }

    #[test]
    fn test_build_from_config_https() {
        let gateway = GatewayConfig {
            endpoint: "https://ipfs.example.org".into(),
            enforce_tls: true,
            ..Default::default()
        };
        assert!(build_from_config(&gateway).is_ok());
    }
}
