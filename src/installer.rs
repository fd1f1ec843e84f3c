// CLASSIFICATION: COMMUNITY
// Filename: installer.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-02-24

//! One-shot interactive BMC image installer.
//!
//! Downloads an image from a URL, verifies it against its `.md5` sidecar
//! and programs flash slot 0. Best effort and terminal: any failure stops
//! the run, a successful flash reboots the BMC.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::exec::{self, ExecError};
use crate::reimage::file_md5;

/// Where the downloaded image lands.
pub const DEFAULT_IMAGE_PATH: &str = "/home/root/bmc_image";

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("could not read file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("checksum not match")]
    ChecksumMismatch,
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl InstallError {
    /// Exit code for the CLI: failed subcommands pass their status
    /// through, everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::Exec(e) => e.exit_code().unwrap_or(1),
            _ => 1,
        }
    }
}

/// Commands used by the install flow, overridable for tests.
#[derive(Clone)]
pub struct InstallTools {
    pub flash_cmd: PathBuf,
    pub sync_cmd: PathBuf,
    pub reboot_cmd: Option<PathBuf>,
    /// Settle time between sync and flash.
    pub settle: Duration,
}

impl Default for InstallTools {
    fn default() -> Self {
        Self {
            flash_cmd: PathBuf::from(exec::FLASH_UPG),
            sync_cmd: PathBuf::from(exec::SYNC),
            reboot_cmd: Some(PathBuf::from(exec::REBOOT)),
            settle: Duration::from_secs(3),
        }
    }
}

fn fetch(url: &str, dest: &Path) -> Result<(), InstallError> {
    let response = ureq::builder()
        .timeout(Duration::from_secs(600))
        .build()
        .get(url)
        .call()
        .map_err(|source| InstallError::Download {
            url: url.to_owned(),
            source: Box::new(source),
        })?;
    let mut file = File::create(dest)?;
    std::io::copy(&mut response.into_reader(), &mut file)?;
    Ok(())
}

/// Download, verify and flash an image from `url`.
///
/// The `.md5` sidecar is expected next to the image at `<url>.md5`.
pub fn install(url: &str, image_path: &Path, tools: &InstallTools) -> Result<(), InstallError> {
    println!("Downloading the image, it will take a few minutes ...");
    fetch(url, image_path)?;

    let sidecar_url = format!("{url}.md5");
    let sidecar_path = PathBuf::from(format!("{}.md5", image_path.display()));
    fetch(&sidecar_url, &sidecar_path)?;

    let recorded = fs::read_to_string(&sidecar_path).map_err(|source| InstallError::FileRead {
        path: sidecar_path.display().to_string(),
        source,
    })?;
    let recorded = recorded.lines().next().unwrap_or("").trim().to_owned();
    println!("checksum is: {recorded}");

    exec::run_checked(&tools.sync_cmd.to_string_lossy(), &[])?;

    let computed = file_md5(image_path).map_err(|source| InstallError::FileRead {
        path: image_path.display().to_string(),
        source,
    })?;
    println!("calculated checksum: {computed}");
    if recorded != computed {
        println!("checksum not match");
        return Err(InstallError::ChecksumMismatch);
    }
    println!("checksum match");

    // let the sync settle before touching flash
    thread::sleep(tools.settle);

    println!("program the flash, it will take a few minutes ...");
    exec::run_checked(
        &tools.flash_cmd.to_string_lossy(),
        &["0", &image_path.display().to_string()],
    )?;

    println!("flash programmed, rebooting BMC ...");
    if let Some(reboot) = &tools.reboot_cmd {
        exec::run_checked(&reboot.to_string_lossy(), &[])?;
    }
    Ok(())
}
