// CLASSIFICATION: COMMUNITY
// Filename: reimage.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-02-24

//! Config-driven reimage sequencer for powershelves.
//!
//! Linear pipeline: read `/home/root/reimage.json` → check the image
//! matches the installed platform → optionally download image + `.md5`
//! sidecar → verify the checksum → flash → reboot. Every failure is
//! terminal; nothing is retried. A platform mismatch additionally deletes
//! the config file so a bad config cannot loop the shelf through repeated
//! attempts.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use log::warn;
use md5::{Digest, Md5};
use serde::Deserialize;
use thiserror::Error;

use crate::exec::{self, ExecError};

/// Install configuration dropped on the shelf by the fleet tooling.
#[derive(Debug, Deserialize)]
pub struct ReimageConfig {
    /// Image file name; also implies the target platform.
    pub image: String,
    /// Remote folder to fetch from; absent means the image is already local.
    pub image_folder_url: Option<String>,
    /// Flash slot handed to `flash-upg`.
    #[serde(default)]
    pub flash_num: u32,
}

/// Minimum `MemFree` (kB) required before downloading; images are staged
/// in RAM-backed storage on these shelves.
pub const FREE_MEM_REQUIRED_KB: u64 = 35000;

/// Filesystem locations and commands for one run.
///
/// Production values come from [`ReimagePaths::default`]; tests point
/// everything into a scratch directory.
#[derive(Clone)]
pub struct ReimagePaths {
    pub config_file: PathBuf,
    pub log_file: PathBuf,
    pub meminfo: PathBuf,
    /// Directory holding (or receiving) the image and its sidecar.
    pub work_dir: PathBuf,
    pub version_cmd: PathBuf,
    pub flash_cmd: PathBuf,
    /// Reboot command run after a successful flash; `None` skips it.
    pub reboot_cmd: Option<PathBuf>,
}

impl Default for ReimagePaths {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("/home/root/reimage.json"),
            log_file: PathBuf::from("/mnt/data/reimage_log"),
            meminfo: PathBuf::from("/proc/meminfo"),
            work_dir: PathBuf::from("/home/root"),
            version_cmd: PathBuf::from(exec::SW_VERSION),
            flash_cmd: PathBuf::from(exec::FLASH_UPG),
            reboot_cmd: Some(PathBuf::from(exec::REBOOT)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReimageError {
    #[error("could not read reimage configuration file: {0}")]
    ConfigRead(#[source] std::io::Error),
    #[error("required data missing in configuration file: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("could not determine if image is matching the platform")]
    PlatformUnknown,
    #[error("image type does not match the platform")]
    PlatformMismatch,
    #[error("not enough free memory to download ({free_kb} kB free, {FREE_MEM_REQUIRED_KB} kB required)")]
    LowMemory { free_kb: u64 },
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
    #[error("could not remove file {path}: {source}")]
    FileRemove {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("checksum not matching for {image}")]
    ChecksumMismatch { image: String },
    #[error("flashing failed: {image}")]
    FlashFailed { image: String },
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Terminal state of a sequencer run.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No config file present; nothing to do.
    NoConfig,
    /// Image flashed (and reboot issued when configured).
    Flashed,
}

/// Platform identity of a shelf or an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Delta,
    Lightning,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Delta => write!(f, "Delta"),
            Platform::Lightning => write!(f, "Lightning"),
        }
    }
}

/// Identify the installed platform from the version tool's output.
///
/// Some firmware builds misspell the label as "Lighting"; both spellings
/// identify a Lightning shelf.
pub fn platform_from_version(output: &str) -> Option<Platform> {
    if output.contains("Delta") {
        Some(Platform::Delta)
    } else if output.contains("Lightning") || output.contains("Lighting") {
        Some(Platform::Lightning)
    } else {
        None
    }
}

/// Identify the platform an image file is built for from its name.
pub fn platform_from_image(image: &str) -> Option<Platform> {
    if image.contains("delta") {
        Some(Platform::Delta)
    } else if image.contains("lightning") {
        Some(Platform::Lightning)
    } else {
        None
    }
}

/// MD5 hex digest of a file, read in 4 kB chunks.
pub fn file_md5(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Md5::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// The reimage pipeline over one [`ReimagePaths`] environment.
pub struct Sequencer {
    paths: ReimagePaths,
}

impl Sequencer {
    pub fn new(paths: ReimagePaths) -> Self {
        Self { paths }
    }

    /// Append a timestamped line to the reimage log and mirror it to the
    /// process log. The log file is best effort; a full `/mnt/data` must
    /// not stop an install.
    pub fn log(&self, message: &str) {
        let stamp = Local::now().format("%m/%d/%Y %H:%M:%S");
        let line = format!("{stamp} {message}");
        println!("{line}");
        if let Ok(mut f) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.paths.log_file)
        {
            let _ = writeln!(f, "{line}");
        }
    }

    /// Run the whole pipeline.
    pub fn run(&self) -> Result<Outcome, ReimageError> {
        if !self.paths.config_file.is_file() {
            return Ok(Outcome::NoConfig);
        }
        let cfg = self.read_config()?;

        if let Err(e) = self.validate_platform(&cfg.image) {
            self.log(&format!("{e}, aborting"));
            self.delete_config();
            return Err(e);
        }

        if let Some(folder) = &cfg.image_folder_url {
            self.download_image(&cfg.image, folder)?;
        }

        let image_path = self.paths.work_dir.join(&cfg.image);
        self.validate_checksum(&image_path)?;
        self.flash(cfg.flash_num, &image_path)?;
        Ok(Outcome::Flashed)
    }

    fn read_config(&self) -> Result<ReimageConfig, ReimageError> {
        let data = fs::read_to_string(&self.paths.config_file)
            .map_err(ReimageError::ConfigRead)?;
        serde_json::from_str(&data).map_err(ReimageError::ConfigParse)
    }

    fn delete_config(&self) {
        if let Err(e) = fs::remove_file(&self.paths.config_file) {
            warn!(
                "error while deleting file {}: {}",
                self.paths.config_file.display(),
                e
            );
        }
    }

    fn validate_platform(&self, image: &str) -> Result<(), ReimageError> {
        let shelf = exec::run_checked(&self.paths.version_cmd.to_string_lossy(), &[])
            .ok()
            .as_deref()
            .and_then(platform_from_version);
        let target = platform_from_image(image);
        match (shelf, target) {
            (None, _) | (_, None) => Err(ReimageError::PlatformUnknown),
            (Some(a), Some(b)) if a != b => Err(ReimageError::PlatformMismatch),
            _ => Ok(()),
        }
    }

    fn free_mem_kb(&self) -> u64 {
        let Ok(data) = fs::read_to_string(&self.paths.meminfo) else {
            self.log(&format!(
                "Could not read file: {}, aborting",
                self.paths.meminfo.display()
            ));
            return 0;
        };
        for line in data.lines() {
            if line.contains("MemFree") {
                return line
                    .split_whitespace()
                    .nth(1)
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
            }
        }
        0
    }

    fn remove_stale(&self, path: &Path) -> Result<(), ReimageError> {
        if path.exists() {
            fs::remove_file(path).map_err(|source| {
                self.log(&format!("File {} can not be removed", path.display()));
                ReimageError::FileRemove {
                    path: path.display().to_string(),
                    source,
                }
            })?;
        }
        Ok(())
    }

    fn fetch(&self, url: &str, dest: &Path) -> Result<(), ReimageError> {
        let map_err = |source: ureq::Error| {
            self.log(&format!("Exception downloading {url}, aborting"));
            ReimageError::Download {
                url: url.to_owned(),
                source: Box::new(source),
            }
        };
        let response = ureq::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .get(url)
            .call()
            .map_err(map_err)?;
        let mut file = File::create(dest)?;
        std::io::copy(&mut response.into_reader(), &mut file)?;
        Ok(())
    }

    /// Download the image and its `.md5` sidecar from
    /// `<folder>/<image>/<image>[.md5]`, deleting any stale local copies
    /// first and refusing to start below the free-memory threshold.
    fn download_image(&self, image: &str, folder: &str) -> Result<(), ReimageError> {
        let sidecar = format!("{image}.md5");
        let image_path = self.paths.work_dir.join(image);
        let sidecar_path = self.paths.work_dir.join(&sidecar);
        self.remove_stale(&image_path)?;
        self.remove_stale(&sidecar_path)?;

        let free_kb = self.free_mem_kb();
        if free_kb < FREE_MEM_REQUIRED_KB {
            self.log("No free memory (less than 35MB)");
            return Err(ReimageError::LowMemory { free_kb });
        }

        let base = folder.trim_end_matches('/');
        self.fetch(&format!("{base}/{image}/{image}"), &image_path)?;
        self.fetch(&format!("{base}/{image}/{sidecar}"), &sidecar_path)?;
        Ok(())
    }

    /// Compare the image's MD5 digest against the sidecar, byte for byte.
    fn validate_checksum(&self, image_path: &Path) -> Result<(), ReimageError> {
        let sidecar = PathBuf::from(format!("{}.md5", image_path.display()));
        let recorded = fs::read_to_string(&sidecar).map_err(|source| {
            self.log(&format!(
                "Could not read file: {}, aborting",
                sidecar.display()
            ));
            ReimageError::FileRead {
                path: sidecar.display().to_string(),
                source,
            }
        })?;
        let recorded = recorded.lines().next().unwrap_or("").trim();

        let computed = file_md5(image_path).map_err(|source| {
            self.log(&format!(
                "Could not read file: {}, aborting",
                image_path.display()
            ));
            ReimageError::FileRead {
                path: image_path.display().to_string(),
                source,
            }
        })?;

        if recorded != computed {
            self.log("Checksum not matching, aborting");
            return Err(ReimageError::ChecksumMismatch {
                image: image_path.display().to_string(),
            });
        }
        Ok(())
    }

    /// Invoke the flashing tool; on success log and reboot, on failure log
    /// and stop. No retry either way.
    fn flash(&self, flash_num: u32, image_path: &Path) -> Result<(), ReimageError> {
        let image = image_path.display().to_string();
        let status = exec::run_checked(
            &self.paths.flash_cmd.to_string_lossy(),
            &[&flash_num.to_string(), &image],
        );
        match status {
            Ok(_) => {
                self.log(&format!("success: flashed: {image}"));
                if let Some(reboot) = &self.paths.reboot_cmd {
                    let _ = exec::run(&reboot.to_string_lossy(), &[]);
                }
                Ok(())
            }
            Err(_) => {
                self.log(&format!("failure: flashing failed: {image}"));
                Err(ReimageError::FlashFailed { image })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_from_version_output() {
        assert_eq!(
            platform_from_version("Delta powershelf v2.1"),
            Some(Platform::Delta)
        );
        assert_eq!(
            platform_from_version("Lightning shelf sw 1.4"),
            Some(Platform::Lightning)
        );
        // historical misspelling still identifies Lightning
        assert_eq!(
            platform_from_version("Lighting shelf sw 1.0"),
            Some(Platform::Lightning)
        );
        assert_eq!(platform_from_version("unknown shelf"), None);
    }

    #[test]
    fn platform_from_image_name() {
        assert_eq!(
            platform_from_image("lightning_fw.bin"),
            Some(Platform::Lightning)
        );
        assert_eq!(platform_from_image("delta_fw_2.bin"), Some(Platform::Delta));
        assert_eq!(platform_from_image("generic.bin"), None);
    }

    #[test]
    fn md5_matches_known_digest() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut f, b"hello world\n").unwrap();
        // md5sum of "hello world\n"
        assert_eq!(
            file_md5(f.path()).unwrap(),
            "6f5902ac237024bdd0c176cb93063dc4"
        );
    }

    #[test]
    fn config_parses_with_defaults() {
        let cfg: ReimageConfig =
            serde_json::from_str(r#"{"image": "lightning_fw.bin"}"#).unwrap();
        assert_eq!(cfg.image, "lightning_fw.bin");
        assert_eq!(cfg.flash_num, 0);
        assert!(cfg.image_folder_url.is_none());
    }

    #[test]
    fn config_requires_image() {
        let r: Result<ReimageConfig, _> = serde_json::from_str(r#"{"flash_num": 1}"#);
        assert!(r.is_err());
    }
}
