//! Pre-build asset compression
//!
//! Scans a flat assets directory and produces gzip-compressed siblings
//! (`style.css` -> `style.css.gz`) for the file types a firmware's embedded
//! web server wants to serve pre-compressed. Artifacts that are already up
//! to date are left alone, so a no-change rebuild performs zero writes.
//!
//! The scan is non-recursive by design: only direct entries of the assets
//! directory are considered.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{FlashprepError, FlashprepResult};
use crate::writer::atomic_write;

/// File extensions worth gzipping for web serving (case-insensitive)
pub const COMPRESS_EXTENSIONS: [&str; 5] = ["html", "css", "js", "svg", "ico"];

/// Options for a compression pass
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressOptions {
    /// Report what would be compressed without writing anything
    pub dry_run: bool,
}

/// A source file and the artifact produced (or planned) for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedAsset {
    pub source: PathBuf,
    pub artifact: PathBuf,
}

/// Result of a compression pass
#[derive(Debug, Default)]
pub struct CompressReport {
    /// Artifacts written this pass (or planned, under dry-run)
    pub written: Vec<CompressedAsset>,
    /// Eligible files whose artifact was already up to date
    pub skipped: Vec<PathBuf>,
    /// The assets directory was absent; nothing was scanned
    pub missing_dir: bool,
}

impl CompressReport {
    /// True when the pass touched nothing on disk
    pub fn is_noop(&self) -> bool {
        self.written.is_empty()
    }
}

/// Compress all eligible assets in `assets_dir` that are stale.
///
/// Directory entries are processed in whatever order the OS yields them;
/// the first per-file failure aborts the pass. A missing assets directory
/// is not an error - the report comes back with `missing_dir` set and no
/// work done.
pub fn compress_assets(
    assets_dir: &Path,
    options: &CompressOptions,
) -> FlashprepResult<CompressReport> {
    let mut report = CompressReport::default();

    if !assets_dir.exists() {
        report.missing_dir = true;
        return Ok(report);
    }

    for entry in fs::read_dir(assets_dir)? {
        let path = entry?.path();

        // Skip directories and files with unsupported extensions
        if !path.is_file() || !is_compressible(&path) {
            continue;
        }

        let artifact = gzip_sibling(&path);
        if !needs_compression(&path, &artifact)? {
            report.skipped.push(path);
            continue;
        }

        if !options.dry_run {
            compress_file(&path, &artifact)?;
        }
        report.written.push(CompressedAsset {
            source: path,
            artifact,
        });
    }

    Ok(report)
}

/// Gzip `source` into `dest`, atomically replacing any existing artifact.
pub fn compress_file(source: &Path, dest: &Path) -> FlashprepResult<()> {
    let raw = fs::read(source).map_err(|e| FlashprepError::Compress {
        path: source.to_path_buf(),
        source: e,
    })?;

    let mut encoder = GzEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
    encoder
        .write_all(&raw)
        .and_then(|_| encoder.finish())
        .map_err(|e| FlashprepError::Compress {
            path: source.to_path_buf(),
            source: e,
        })
        .and_then(|gz| atomic_write(dest, &gz))
}

/// Whether a file's extension belongs to the compression allow-set.
pub fn is_compressible(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            COMPRESS_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Sibling artifact path: the full filename with `.gz` appended.
pub fn gzip_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".gz");
    path.with_file_name(name)
}

/// An artifact is stale when it is absent or older than its source.
fn needs_compression(source: &Path, artifact: &Path) -> FlashprepResult<bool> {
    if !artifact.exists() {
        return Ok(true);
    }
    Ok(mtime(source)? > mtime(artifact)?)
}

fn mtime(path: &Path) -> FlashprepResult<SystemTime> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| FlashprepError::Metadata {
            path: path.to_path_buf(),
            source: e,
        })
}
