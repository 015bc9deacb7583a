//! esptool.py invocation assembly
//!
//! Builds the argument list for the external flashing utility and can run
//! it directly. Nothing here speaks the flashing protocol - the external
//! tool owns that; this module only assembles command lines.
//!
//! The flash layout is the standard ESP32 triple: bootloader at `0x0`,
//! partition table at `0x8000`, application image at `0x10000`.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FlashprepError, FlashprepResult};

/// Name of the external flashing utility
pub const ESPTOOL: &str = "esptool.py";

/// Default upload baud rate when none is configured
pub const DEFAULT_BAUD: u32 = 460_800;

/// Flash offset of the second-stage bootloader
pub const BOOTLOADER_OFFSET: u32 = 0x0;
/// Flash offset of the partition table
pub const PARTITION_TABLE_OFFSET: u32 = 0x8000;
/// Flash offset of the application image
pub const APPLICATION_OFFSET: u32 = 0x10000;

/// Build-system placeholder for the serial port
pub const PLACEHOLDER_PORT: &str = "$UPLOAD_PORT";
/// Build-system placeholder for the baud rate
pub const PLACEHOLDER_BAUD: &str = "$UPLOAD_SPEED";
/// Build-system placeholder for the application image
pub const PLACEHOLDER_SOURCE: &str = "$SOURCE";

/// Supported chip identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chip {
    Esp32,
    Esp32c3,
    Esp32c6,
    Esp32s2,
    #[default]
    Esp32s3,
}

impl Chip {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chip::Esp32 => "esp32",
            Chip::Esp32c3 => "esp32c3",
            Chip::Esp32c6 => "esp32c6",
            Chip::Esp32s2 => "esp32s2",
            Chip::Esp32s3 => "esp32s3",
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chip {
    type Err = FlashprepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "esp32" => Ok(Chip::Esp32),
            "esp32c3" => Ok(Chip::Esp32c3),
            "esp32c6" => Ok(Chip::Esp32c6),
            "esp32s2" => Ok(Chip::Esp32s2),
            "esp32s3" => Ok(Chip::Esp32s3),
            _ => Err(FlashprepError::InvalidChip {
                value: s.to_string(),
            }),
        }
    }
}

/// A flash offset paired with the binary written there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashImage {
    pub offset: u32,
    pub path: String,
}

impl FlashImage {
    /// Offset rendered the way esptool expects it (`0x8000`)
    pub fn offset_arg(&self) -> String {
        format!("{:#x}", self.offset)
    }
}

/// Everything needed to assemble an esptool.py invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub chip: Chip,
    /// Use esptool's RAM stub loader. Off by default; some boards reset
    /// unreliably with the stub, so uploads run with `--no-stub`.
    pub use_stub: bool,
    /// Verify flash contents after writing
    pub verify: bool,
    pub flash_mode: String,
    pub flash_freq: String,
    pub flash_size: String,
    /// Path to the second-stage bootloader binary
    pub bootloader: String,
    /// Path to the partition table binary
    pub partition_table: String,
}

impl Default for UploadPlan {
    fn default() -> Self {
        Self {
            chip: Chip::default(),
            use_stub: false,
            verify: false,
            flash_mode: "dio".to_string(),
            flash_freq: "40m".to_string(),
            flash_size: "detect".to_string(),
            bootloader: "bootloader.bin".to_string(),
            partition_table: "partition-table.bin".to_string(),
        }
    }
}

impl UploadPlan {
    /// The offset/image triples written by `write_flash`, in flash order.
    pub fn images(&self, firmware: &str) -> [FlashImage; 3] {
        [
            FlashImage {
                offset: BOOTLOADER_OFFSET,
                path: self.bootloader.clone(),
            },
            FlashImage {
                offset: PARTITION_TABLE_OFFSET,
                path: self.partition_table.clone(),
            },
            FlashImage {
                offset: APPLICATION_OFFSET,
                path: firmware.to_string(),
            },
        ]
    }

    /// Assemble the full uploader flag list.
    ///
    /// `port`, `baud` and `firmware` may be concrete values or build-system
    /// placeholders (`$UPLOAD_PORT`, `$UPLOAD_SPEED`, `$SOURCE`). `--verify`
    /// goes last, after the offset/image triples.
    pub fn flags(&self, port: &str, baud: &str, firmware: &str) -> Vec<String> {
        let mut flags: Vec<String> = vec![
            "--chip".into(),
            self.chip.to_string(),
            "--port".into(),
            port.into(),
            "--baud".into(),
            baud.into(),
            "--before".into(),
            "default_reset".into(),
            "--after".into(),
            "hard_reset".into(),
        ];
        if !self.use_stub {
            flags.push("--no-stub".into());
        }
        flags.extend([
            "write_flash".into(),
            "--flash_mode".into(),
            self.flash_mode.clone(),
            "--flash_freq".into(),
            self.flash_freq.clone(),
            "--flash_size".into(),
            self.flash_size.clone(),
        ]);
        for image in self.images(firmware) {
            flags.push(image.offset_arg());
            flags.push(image.path);
        }
        if self.verify {
            flags.push("--verify".into());
        }
        flags
    }

    /// Build the esptool.py command with concrete values.
    pub fn command(&self, port: &str, baud: u32, firmware: &Path) -> Command {
        let mut cmd = Command::new(ESPTOOL);
        cmd.args(self.flags(port, &baud.to_string(), &firmware.display().to_string()));
        cmd
    }

    /// Check if esptool.py is installed and available
    pub fn check_available() -> bool {
        Command::new(ESPTOOL)
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run esptool.py synchronously, inheriting stdio so its progress
    /// output reaches the user.
    pub fn run(&self, port: &str, baud: u32, firmware: &Path) -> FlashprepResult<()> {
        if !Self::check_available() {
            return Err(FlashprepError::EsptoolNotFound);
        }

        let status = self
            .command(port, baud, firmware)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;

        if !status.success() {
            return Err(FlashprepError::UploadFailed {
                code: status.code(),
            });
        }
        Ok(())
    }
}
