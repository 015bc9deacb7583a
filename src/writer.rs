//! Atomic file writer
//!
//! Uses the tempfile + rename pattern so a partially written artifact is
//! never observable at its final path.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::FlashprepResult;

/// Write content to a file atomically.
///
/// The temporary file is created in the destination's own directory so the
/// final rename never crosses a filesystem boundary.
pub fn atomic_write(path: &Path, content: &[u8]) -> FlashprepResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");

        atomic_write(&path, b"Hello, World!").unwrap();

        assert!(path.exists());
        assert_eq!(fs::read(&path).unwrap(), b"Hello, World!");
    }

    #[test]
    fn atomic_write_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");

        fs::write(&path, "Original").unwrap();
        atomic_write(&path, b"Replaced").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Replaced");
    }

    #[test]
    fn atomic_write_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");

        atomic_write(&path, &[0u8; 1024]).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
