//! Error types for Flashprep
//!
//! Uses `thiserror` for library errors; the binary wraps them in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Flashprep operations
pub type FlashprepResult<T> = Result<T, FlashprepError>;

/// Main error type for Flashprep operations
#[derive(Error, Debug)]
pub enum FlashprepError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read or compress a single asset
    #[error("failed to compress {path}: {source}")]
    Compress {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to stat a file while checking staleness
    #[error("failed to read metadata for {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid TOML in the config file
    #[error("invalid config in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// Unknown chip identifier
    #[error("unknown chip '{value}' - expected one of: esp32, esp32c3, esp32c6, esp32s2, esp32s3")]
    InvalidChip { value: String },

    /// esptool.py is not installed or not on PATH
    #[error("esptool.py not found on PATH - install it with 'pip install esptool'")]
    EsptoolNotFound,

    /// No serial port given on the command line, in config, or via FLASHPREP_PORT
    #[error("no upload port configured - pass --port, set FLASHPREP_PORT, or add it to flashprep.toml")]
    PortRequired,

    /// esptool.py exited with a failure status
    #[error("esptool.py failed with exit code: {code:?}")]
    UploadFailed { code: Option<i32> },
}
