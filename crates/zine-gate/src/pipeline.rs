//! End-to-end open: fetch, gate, inspect, deliver

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zine_core::{ContentId, GateError, GateResult};
use zine_crypto::SuiteCache;
use zine_storage::ContentStore;

use crate::archive::{inspect, ArchiveSummary};
use crate::delivery::deliver;
use crate::gate::{attempt_decrypt, unix_now, Credentials, GateOptions};

pub struct OpenRequest<'a> {
    pub cid: &'a ContentId,
    pub credentials: Credentials,
    pub output_dir: &'a Path,
    pub overwrite: bool,
}

#[derive(Debug)]
pub struct OpenOutcome {
    /// Where `{cid}.zip` was written
    pub path: PathBuf,
    pub summary: ArchiveSummary,
    pub bytes: usize,
}

/// Run one full attempt. Nothing is written unless every stage succeeds.
pub async fn open_zine(
    cache: &SuiteCache,
    store: &ContentStore,
    req: OpenRequest<'_>,
    options: &GateOptions,
) -> GateResult<OpenOutcome> {
    let suite = cache.get_or_init().await?;
    let record = store.fetch_metadata(req.cid).await?;

    // scrypt is CPU-bound; keep it off the async workers.
    let credentials = req.credentials;
    let options_owned = *options;
    let plaintext = tokio::task::spawn_blocking(move || {
        attempt_decrypt(&suite, &record, &credentials, unix_now(), &options_owned)
    })
    .await
    .map_err(|e| {
        warn!(error = %e, "gate task aborted");
        GateError::InvalidPassphraseOrCorruptData
    })?
    .inspect_err(|e| info!(cid = %req.cid, reason = %e, "attempt rejected"))?;

    let summary = inspect(plaintext.as_bytes())?;
    let path = deliver(&plaintext, req.output_dir, req.cid, req.overwrite)?;

    info!(
        cid = %req.cid,
        entries = summary.entries.len(),
        path = %path.display(),
        "zine opened"
    );

    Ok(OpenOutcome {
        path,
        summary,
        bytes: plaintext.len(),
    })
}
