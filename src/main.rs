//! Flashprep CLI - pre-build and upload glue for ESP32 firmware projects
//!
//! Usage: flashprep <COMMAND>
//!
//! Commands:
//!   compress  Gzip stale web assets before the build
//!   flags     Print esptool.py uploader flags for build-system integration
//!   upload    Flash a firmware image with esptool.py

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use flashprep::config::{self, Config, CONFIG_FILE};
use flashprep::upload::{Chip, UploadPlan, ESPTOOL};

/// Flashprep - pre-build and upload glue for ESP32 firmware projects
#[derive(Parser, Debug)]
#[command(name = "flashprep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format for CI
    #[arg(long, default_value = "false")]
    json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Gzip stale web assets (pre-build step)
    Compress {
        /// Path to the assets directory
        #[arg(short, long)]
        assets: Option<PathBuf>,

        /// Dry run - show what would be done
        #[arg(long)]
        dry_run: bool,
    },

    /// Print esptool.py uploader flags for build-system integration
    Flags {
        /// Chip identifier (e.g. esp32s3)
        #[arg(long)]
        chip: Option<String>,

        /// Serial port (defaults to the $UPLOAD_PORT placeholder)
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate (defaults to the $UPLOAD_SPEED placeholder)
        #[arg(short, long)]
        baud: Option<u32>,

        /// Application image path (defaults to the $SOURCE placeholder)
        #[arg(long)]
        firmware: Option<String>,

        /// Verify flash contents after writing
        #[arg(long)]
        verify: bool,
    },

    /// Flash a firmware image with esptool.py
    Upload {
        /// Path to the application image
        firmware: PathBuf,

        /// Chip identifier (e.g. esp32s3)
        #[arg(long)]
        chip: Option<String>,

        /// Serial port (e.g. /dev/ttyUSB0)
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate
        #[arg(short, long)]
        baud: Option<u32>,

        /// Verify flash contents after writing
        #[arg(long)]
        verify: bool,

        /// Print the esptool.py command without running it
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compress { assets, dry_run } => {
            cmd_compress(assets, dry_run, cli.json, cli.verbose)
        }
        Commands::Flags {
            chip,
            port,
            baud,
            firmware,
            verify,
        } => cmd_flags(chip, port, baud, firmware, verify, cli.json),
        Commands::Upload {
            firmware,
            chip,
            port,
            baud,
            verify,
            dry_run,
        } => cmd_upload(&firmware, chip, port, baud, verify, dry_run, cli.json),
    }
}

/// Load flashprep.toml from the working directory if present, then apply
/// FLASHPREP_* environment overrides.
fn load_config(json: bool) -> Result<Config> {
    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        return Ok(config::with_env_overrides(Config::default()));
    }

    let (loaded, warnings) = Config::load_with_warnings(path)?;
    if !json {
        for warning in &warnings {
            eprintln!(
                "⚠ Unknown config key '{}' in {}",
                warning.key,
                warning.file.display()
            );
        }
    }
    Ok(config::with_env_overrides(loaded))
}

/// Assemble an upload plan from config plus command-line overrides.
fn build_plan(config: &Config, chip: Option<String>, verify: bool) -> Result<UploadPlan> {
    let chip = match chip {
        Some(value) => value.parse::<Chip>()?,
        None => config.upload.chip,
    };

    Ok(UploadPlan {
        chip,
        use_stub: config.upload.stub,
        verify: verify || config.upload.verify,
        bootloader: config.upload.bootloader.clone(),
        partition_table: config.upload.partition_table.clone(),
        ..UploadPlan::default()
    })
}

fn banner(text: &str, emoji: &str) {
    use is_terminal::IsTerminal;

    if std::io::stdout().is_terminal() {
        println!("{} {}", emoji, text);
    } else {
        println!("{}", text);
    }
}

fn cmd_compress(assets: Option<PathBuf>, dry_run: bool, json: bool, verbose: u8) -> Result<()> {
    use flashprep::compress::{compress_assets, CompressOptions};

    let config = load_config(json)?;
    let assets_dir = assets.unwrap_or(config.assets.dir);

    if !json {
        banner("Flashprep Compress", "🗜");
        println!("Assets: {}", assets_dir.display());
        if dry_run {
            println!("Mode: Dry run");
        }
        println!();
    }

    let report = compress_assets(&assets_dir, &CompressOptions { dry_run })?;

    if json {
        let output = serde_json::json!({
            "event": "compress",
            "status": "success",
            "missing_dir": report.missing_dir,
            "written": report.written.len(),
            "skipped": report.skipped.len(),
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if report.missing_dir {
        println!("Assets directory not found, skipping compression");
        return Ok(());
    }

    for asset in &report.written {
        if dry_run {
            println!(
                "Would compress: {} -> {}",
                asset.source.display(),
                asset.artifact.display()
            );
        } else {
            println!(
                "Compressed: {} -> {}",
                asset.source.display(),
                asset.artifact.display()
            );
        }
    }
    if verbose > 0 {
        for path in &report.skipped {
            println!("Up to date: {}", path.display());
        }
    }

    println!();
    println!(
        "Summary: {} compressed, {} up to date",
        report.written.len(),
        report.skipped.len()
    );

    Ok(())
}

fn cmd_flags(
    chip: Option<String>,
    port: Option<String>,
    baud: Option<u32>,
    firmware: Option<String>,
    verify: bool,
    json: bool,
) -> Result<()> {
    use flashprep::upload::{PLACEHOLDER_BAUD, PLACEHOLDER_PORT, PLACEHOLDER_SOURCE};

    let config = load_config(json)?;
    let plan = build_plan(&config, chip, verify)?;

    let port = port
        .or(config.upload.port)
        .unwrap_or_else(|| PLACEHOLDER_PORT.to_string());
    let baud = baud
        .or(config.upload.baud)
        .map(|b| b.to_string())
        .unwrap_or_else(|| PLACEHOLDER_BAUD.to_string());
    let firmware = firmware.unwrap_or_else(|| PLACEHOLDER_SOURCE.to_string());

    let flags = plan.flags(&port, &baud, &firmware);

    if json {
        let output = serde_json::json!({
            "event": "flags",
            "uploader": ESPTOOL,
            "flags": flags,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", flags.join(" "));
    }

    Ok(())
}

fn cmd_upload(
    firmware: &Path,
    chip: Option<String>,
    port: Option<String>,
    baud: Option<u32>,
    verify: bool,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    use flashprep::error::FlashprepError;
    use flashprep::upload::DEFAULT_BAUD;

    let config = load_config(json)?;
    let plan = build_plan(&config, chip, verify)?;

    let port = port
        .or(config.upload.port)
        .ok_or(FlashprepError::PortRequired)?;
    let baud = baud.or(config.upload.baud).unwrap_or(DEFAULT_BAUD);

    if !json {
        banner("Flashprep Upload", "⚡");
        println!("Chip: {}", plan.chip);
        println!("Port: {}", port);
        println!("Baud: {}", baud);
        println!("Image: {}", firmware.display());
        println!();
    }

    let rendered = format!(
        "{} {}",
        ESPTOOL,
        plan.flags(&port, &baud.to_string(), &firmware.display().to_string())
            .join(" ")
    );

    if dry_run {
        if json {
            let output = serde_json::json!({
                "event": "upload",
                "status": "dry-run",
                "command": rendered,
            });
            println!("{}", serde_json::to_string(&output)?);
        } else {
            println!("Would run: {}", rendered);
        }
        return Ok(());
    }

    plan.run(&port, baud, firmware)?;

    if json {
        let output = serde_json::json!({
            "event": "upload",
            "status": "success",
            "command": rendered,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("✓ Upload complete");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_compress() {
        let cli = Cli::try_parse_from(["flashprep", "compress"]).unwrap();
        assert!(matches!(cli.command, Commands::Compress { .. }));
    }

    #[test]
    fn test_cli_parse_compress_with_args() {
        let cli = Cli::try_parse_from(["flashprep", "compress", "--assets", "web", "--dry-run"])
            .unwrap();

        if let Commands::Compress { assets, dry_run } = cli.command {
            assert_eq!(assets, Some(PathBuf::from("web")));
            assert!(dry_run);
        } else {
            panic!("Expected Compress command");
        }
    }

    #[test]
    fn test_cli_parse_flags() {
        let cli = Cli::try_parse_from(["flashprep", "flags", "--chip", "esp32c3"]).unwrap();
        if let Commands::Flags { chip, port, .. } = cli.command {
            assert_eq!(chip, Some("esp32c3".to_string()));
            assert_eq!(port, None);
        } else {
            panic!("Expected Flags command");
        }
    }

    #[test]
    fn test_cli_parse_upload() {
        let cli = Cli::try_parse_from([
            "flashprep",
            "upload",
            "firmware.bin",
            "--port",
            "/dev/ttyUSB0",
            "--baud",
            "921600",
            "--verify",
        ])
        .unwrap();

        if let Commands::Upload {
            firmware,
            port,
            baud,
            verify,
            ..
        } = cli.command
        {
            assert_eq!(firmware, PathBuf::from("firmware.bin"));
            assert_eq!(port, Some("/dev/ttyUSB0".to_string()));
            assert_eq!(baud, Some(921_600));
            assert!(verify);
        } else {
            panic!("Expected Upload command");
        }
    }

    #[test]
    fn test_cli_parse_upload_requires_firmware() {
        assert!(Cli::try_parse_from(["flashprep", "upload"]).is_err());
    }

    #[test]
    fn test_cli_json_flag() {
        let cli = Cli::try_parse_from(["flashprep", "--json", "compress"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["flashprep", "-vv", "compress"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
