//! Fetch-by-content-id over an OpenDAL operator

use std::future::Future;
use std::time::Duration;

use opendal::Operator;
use tracing::debug;
use zine_core::config::GatewayConfig;
use zine_core::{ContentId, GateError, GateResult, MetadataRecord};

/// Read-only content-addressed store.
///
/// Transport failures, missing objects, timeouts and non-JSON bodies surface
/// as [`GateError::Retrieval`]. A JSON body that is not a valid record is a
/// [`GateError::Decode`]. Nothing is retried here; the caller starts a fresh
/// attempt instead.
#[derive(Clone)]
pub struct ContentStore {
    op: Operator,
    timeout: Option<Duration>,
}

impl ContentStore {
    pub fn new(op: Operator, timeout: Option<Duration>) -> Self {
        Self { op, timeout }
    }

    pub fn from_config(gateway: &GatewayConfig) -> anyhow::Result<Self> {
        let op = crate::operator::build_from_config(gateway)?;
        let timeout = (gateway.timeout_secs > 0).then(|| Duration::from_secs(gateway.timeout_secs));
        Ok(Self::new(op, timeout))
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }

    /// Fetch the raw bytes addressed by `cid`.
    pub async fn fetch(&self, cid: &ContentId) -> GateResult<Vec<u8>> {
        let buf = within_deadline(self.timeout, cid, self.op.read(cid.as_str())).await?;
        let bytes = buf.to_vec();
        debug!(cid = %cid, bytes = bytes.len(), "fetched object");
        Ok(bytes)
    }

    /// Fetch and parse the metadata record addressed by `cid`.
    pub async fn fetch_metadata(&self, cid: &ContentId) -> GateResult<MetadataRecord> {
        let body = self.fetch(cid).await?;
        MetadataRecord::from_json(&body)
    }
}

/// Await `read`, giving up after `limit`. Both expiry and a backend error
/// surface as `Retrieval`.
async fn within_deadline<T>(
    limit: Option<Duration>,
    cid: &ContentId,
    read: impl Future<Output = opendal::Result<T>>,
) -> GateResult<T> {
    let result = match limit {
        Some(limit) => tokio::time::timeout(limit, read).await.map_err(|_| {
            GateError::Retrieval(format!("fetching {cid}: timed out after {limit:?}"))
        })?,
        None => read.await,
    };
    result.map_err(|e| GateError::Retrieval(format!("fetching {cid}: {e}")))
}
