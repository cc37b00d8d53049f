//! Gateway health check

use anyhow::Result;
use opendal::Operator;

/// Verify the gateway answers for `path` (a HEAD request on HTTP backends)
pub async fn check_health(op: &Operator, path: &str) -> Result<()> {
    op.stat(path)
        .await
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!("gateway health check failed: {e}"))
}

/// Returns true if the gateway is reachable, false otherwise (non-panicking)
pub async fn is_healthy(op: &Operator, path: &str) -> bool {
    check_health(op, path).await.is_ok()
}
