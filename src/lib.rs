//! Flashprep - pre-build and upload glue for ESP32 firmware projects
//!
//! Flashprep covers the two chores every firmware project with an embedded
//! web UI ends up scripting by hand: gzipping static web assets before the
//! build so the device can serve them pre-compressed, and assembling the
//! esptool.py command line that flashes the finished image.

pub mod compress;
pub mod config;
pub mod error;
pub mod upload;
pub mod writer;

// Re-exports for convenience
pub use compress::{compress_assets, CompressOptions, CompressReport, COMPRESS_EXTENSIONS};
pub use config::{with_env_overrides, Config, ConfigWarning};
pub use error::{FlashprepError, FlashprepResult};
pub use upload::{Chip, FlashImage, UploadPlan, DEFAULT_BAUD, ESPTOOL};
