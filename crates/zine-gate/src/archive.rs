//! Archive check: the decrypted payload must be a readable ZIP

use std::io::Cursor;

use zine_core::{GateError, GateResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ArchiveSummary {
    pub entries: Vec<ArchiveEntry>,
}

impl ArchiveSummary {
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// Read the central directory and list every entry.
pub fn inspect(bytes: &[u8]) -> GateResult<ArchiveSummary> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| GateError::MalformedArchive(e.to_string()))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| GateError::MalformedArchive(format!("entry {i}: {e}")))?;
        entries.push(ArchiveEntry {
            name: file.name().to_string(),
            size: file.size(),
        });
    }

    Ok(ArchiveSummary { entries })
}

#[cfg(test)]
pub(crate) fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_lists_entries() {
        let zip = build_zip(&[
            ("index.html", b"<h1>Zine</h1>"),
            ("pages/2.html", b"<p>plot summary</p>"),
        ]);

        let summary = inspect(&zip).unwrap();
        let names: Vec<_> = summary.entries.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(names, ["index.html", "pages/2.html"]);
        assert_eq!(summary.entries[0].size, 13);
        assert_eq!(summary.total_size(), 13 + 19);
    }

    #[test]
    fn test_inspect_empty_archive() {
        let summary = inspect(&build_zip(&[])).unwrap();
        assert!(summary.entries.is_empty());
        assert_eq!(summary.total_size(), 0);
    }

    #[test]
    fn test_inspect_rejects_non_zip() {
        let err = inspect(b"definitely not a zip file").unwrap_err();
        assert!(matches!(err, GateError::MalformedArchive(_)));
    }

    #[test]
    fn test_inspect_rejects_truncated_zip() {
        let zip = build_zip(&[("index.html", b"<h1>Zine</h1>")]);
        let err = inspect(&zip[..zip.len() / 2]).unwrap_err();
        assert!(matches!(err, GateError::MalformedArchive(_)));
    }
}
