//! Zip archive unpacking.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::IngestError;
use crate::models::DocumentKind;

/// Check whether a file is a zip archive, by content or by extension.
pub fn is_zip(path: &Path) -> bool {
    if let Ok(Some(kind)) = infer::get_from_path(path) {
        return matches!(
            kind.mime_type(),
            "application/zip" | "application/x-zip" | "application/x-zip-compressed"
        );
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Reduce an archive entry path to a safe, flat filename.
///
/// Returns `None` for entries that should not be unpacked: directories,
/// `__MACOSX` metadata, and hidden files.
fn entry_filename(entry_path: &str) -> Option<String> {
    if entry_path.starts_with("__MACOSX") || entry_path.ends_with('/') {
        return None;
    }
    let filename = entry_path.rsplit(['/', '\\']).next().unwrap_or(entry_path);
    if filename.is_empty() || filename.starts_with('.') {
        return None;
    }
    let filename = filename.replace("..", "_");
    Some(filename)
}

/// Extract every supported document in the archive into `dest`.
///
/// Entries from nested folders are flattened; when two entries share a
/// filename only the first is kept.
pub fn extract_supported(archive_path: &Path, dest: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let file = File::open(archive_path).map_err(|e| IngestError::OpenFailed(e.to_string()))?;
    let mut archive = ZipArchive::new(file)?;

    let mut seen = HashSet::new();
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let Some(filename) = entry_filename(entry.name()) else {
            continue;
        };
        if DocumentKind::from_filename(&filename).is_none() {
            tracing::debug!("Skipping unsupported archive entry: {}", entry.name());
            continue;
        }
        if !seen.insert(filename.clone()) {
            tracing::warn!("Skipping duplicate document name in archive: {}", entry.name());
            continue;
        }

        let out_path = dest.join(&filename);
        let mut outfile = File::create(&out_path)?;
        io::copy(&mut entry, &mut outfile)?;
        extracted.push(out_path);
    }

    tracing::info!(
        "Unpacked {} documents from {}",
        extracted.len(),
        archive_path.display()
    );
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_entry_filename() {
        assert_eq!(entry_filename("essay.pdf").as_deref(), Some("essay.pdf"));
        assert_eq!(entry_filename("class/week1/essay.pdf").as_deref(), Some("essay.pdf"));
        assert_eq!(entry_filename("win\\path\\scan.png").as_deref(), Some("scan.png"));
        assert_eq!(entry_filename("a..b.pdf").as_deref(), Some("a_b.pdf"));
        assert_eq!(entry_filename("__MACOSX/._essay.pdf"), None);
        assert_eq!(entry_filename("folder/"), None);
        assert_eq!(entry_filename("folder/.DS_Store"), None);
    }

    #[test]
    fn test_is_zip_by_extension() {
        assert!(is_zip(Path::new("/nonexistent/upload.ZIP")));
        assert!(!is_zip(Path::new("/nonexistent/upload.pdf")));
    }

    #[test]
    fn test_duplicate_entries_keep_first() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("batch.zip");
        {
            let mut zip = zip::ZipWriter::new(File::create(&zip_path).unwrap());
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("a/essay.pdf", options).unwrap();
            zip.write_all(b"first").unwrap();
            zip.start_file("b/essay.pdf", options).unwrap();
            zip.write_all(b"second").unwrap();
            zip.finish().unwrap();
        }
        assert!(is_zip(&zip_path));

        let out = TempDir::new().unwrap();
        let paths = extract_supported(&zip_path, out.path()).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"first");
    }

    #[test]
    fn test_corrupt_archive() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("broken.zip");
        std::fs::write(&zip_path, b"not a zip").unwrap();
        let out = TempDir::new().unwrap();
        assert!(matches!(
            extract_supported(&zip_path, out.path()),
            Err(IngestError::Zip(_))
        ));
    }
}
