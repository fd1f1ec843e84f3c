// CLASSIFICATION: COMMUNITY
// Filename: exec.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-01-09

//! Narrow adapter around the platform shell utilities.
//!
//! Every hardware query in this crate funnels through here: spawn one of
//! the fixed-path `*-util` tools, capture stdout, hand the text back to a
//! parser. Paths are fixed absolute locations with no version negotiation;
//! the tools are trusted external dependencies.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::debug;
use thiserror::Error;

/// Platform tool locations.
pub const FAN_UTIL: &str = "/usr/local/bin/fan-util.sh";
pub const PSU_UTIL: &str = "/usr/local/bin/psu_util";
pub const PSU_ON: &str = "/usr/local/bin/psu_on.sh";
pub const EFUSE_UTIL: &str = "/usr/local/bin/eFuse-util";
pub const EFUSE_UTIL_SH: &str = "/usr/local/bin/eFuse-util.sh";
pub const EFUSE_ON: &str = "/usr/local/bin/eFuse_on.sh";
pub const EFUSE_OFF: &str = "/usr/local/bin/eFuse_off.sh";
pub const SW_VERSION: &str = "/usr/local/bin/get_sw_version.sh";
pub const BMC_ID: &str = "/usr/local/bin/get_bmc_id.sh";
pub const EEPROM: &str = "/usr/local/bin/eeprom.sh";
pub const FLASH_UPG: &str = "/usr/local/bin/flash-upg";
pub const IP: &str = "/sbin/ip";
pub const TOP: &str = "/usr/bin/top";
pub const UPTIME: &str = "/usr/bin/uptime";
pub const UNAME: &str = "/bin/uname";
pub const SYNC: &str = "/bin/sync";
pub const REBOOT: &str = "/sbin/reboot";

/// Errors from launching or supervising a platform tool.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with status {code}")]
    Failed { program: String, code: i32 },
    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

impl ExecError {
    /// Child exit code for CLI passthrough, if the tool ran and failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::Failed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Run a tool and capture stdout, ignoring the exit status.
///
/// The REST handlers classify results from the tool's output text, the way
/// the shell utilities themselves report failure ("fail", "Usage:", ...),
/// so a non-zero status is not an error here.
pub fn run(program: &str, args: &[&str]) -> Result<String, ExecError> {
    let output = Command::new(program)
        .args(args)
        .stderr(Stdio::null())
        .output()
        .map_err(|source| ExecError::Spawn {
            program: program.to_owned(),
            source,
        })?;
    debug!("{} {:?} -> {}", program, args, output.status);
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a tool and require a zero exit status.
pub fn run_checked(program: &str, args: &[&str]) -> Result<String, ExecError> {
    let output = Command::new(program)
        .args(args)
        .stderr(Stdio::null())
        .output()
        .map_err(|source| ExecError::Spawn {
            program: program.to_owned(),
            source,
        })?;
    debug!("{} {:?} -> {}", program, args, output.status);
    if !output.status.success() {
        return Err(ExecError::Failed {
            program: program.to_owned(),
            code: output.status.code().unwrap_or(-1),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a tool but abandon it after `timeout`.
///
/// A hung `*-util` would otherwise stall its REST request forever; the
/// bulk handler issues several tool calls per request and uses this
/// timed-communicate variant for each of them. The child is killed on
/// expiry.
pub fn run_with_timeout(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, ExecError> {
    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ExecError::Spawn {
            program: program.to_owned(),
            source,
        })?;

    let mut stdout = match child.stdout.take() {
        Some(s) => s,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExecError::Timeout {
                program: program.to_owned(),
                timeout,
            });
        }
    };

    let (tx, rx) = mpsc::channel();
    let reader = thread::spawn(move || {
        let mut buf = String::new();
        let _ = stdout.read_to_string(&mut buf);
        let _ = tx.send(buf);
    });

    match rx.recv_timeout(timeout) {
        Ok(buf) => {
            let _ = child.wait();
            let _ = reader.join();
            Ok(buf)
        }
        Err(_) => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = reader.join();
            Err(ExecError::Timeout {
                program: program.to_owned(),
                timeout,
            })
        }
    }
}
