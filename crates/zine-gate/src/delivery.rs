//! Delivery: hand the decrypted archive to the user as `{cid}.zip`

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;
use zine_core::{ContentId, GateError, GateResult};
use zine_crypto::Plaintext;

/// Write `plaintext` to `{dir}/{cid}.zip` via a temp file + rename, so a
/// crash never leaves a half-written archive under the final name.
pub fn deliver(
    plaintext: &Plaintext,
    dir: &Path,
    cid: &ContentId,
    overwrite: bool,
) -> GateResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| GateError::Delivery(format!("creating {}: {e}", dir.display())))?;

    let dest = dir.join(format!("{cid}.zip"));
    if !overwrite && dest.exists() {
        return Err(GateError::Delivery(format!(
            "{} already exists (set output.overwrite = true or pass --overwrite)",
            dest.display()
        )));
    }

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| GateError::Delivery(format!("creating temp file: {e}")))?;
    tmp.write_all(plaintext.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| GateError::Delivery(format!("writing archive: {e}")))?;

    let persisted = if overwrite {
        tmp.persist(&dest)
    } else {
        tmp.persist_noclobber(&dest)
    };
    persisted.map_err(|e| GateError::Delivery(format!("saving {}: {}", dest.display(), e.error)))?;

    info!(path = %dest.display(), bytes = plaintext.len(), "zine delivered");
    Ok(dest)
}
