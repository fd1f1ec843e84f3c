// CLASSIFICATION: COMMUNITY
// Filename: reimage_flow.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-02-27

//! Reimage sequencer scenarios against scratch directories and fake
//! platform tools.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread;

use md5::{Digest, Md5};
use serial_test::serial;
use tiny_http::{Response, Server};

use bmcutil::reimage::{
    file_md5, Outcome, ReimageError, ReimagePaths, Sequencer,
};

const IMAGE_BYTES: &[u8] = b"lightning firmware image payload";

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perm = fs::metadata(&path).unwrap().permissions();
    perm.set_mode(0o755);
    fs::set_permissions(&path, perm).unwrap();
    path
}

/// Scratch environment: fake version + flash tools, generous meminfo.
fn paths_for(dir: &Path, version_line: &str) -> (ReimagePaths, PathBuf) {
    let marker = dir.join("flash_marker");
    let flash_body = format!("echo \"$@\" > {}", marker.display());
    let paths = ReimagePaths {
        config_file: dir.join("reimage.json"),
        log_file: dir.join("reimage_log"),
        meminfo: dir.join("meminfo"),
        work_dir: dir.to_path_buf(),
        version_cmd: write_script(dir, "get_sw_version.sh", &format!("echo \"{version_line}\"")),
        flash_cmd: write_script(dir, "flash-upg", &flash_body),
        reboot_cmd: None,
    };
    fs::write(&paths.meminfo, "MemTotal: 247172 kB\nMemFree: 86460 kB\n").unwrap();
    (paths, marker)
}

fn stage_local_image(dir: &Path, name: &str) -> PathBuf {
    let image = dir.join(name);
    fs::write(&image, IMAGE_BYTES).unwrap();
    let digest = file_md5(&image).unwrap();
    fs::write(dir.join(format!("{name}.md5")), format!("{digest}\n")).unwrap();
    image
}

#[test]
fn no_config_is_a_clean_noop() {
    let dir = tempfile::tempdir().unwrap();
    let (paths, marker) = paths_for(dir.path(), "Lightning shelf 1.2");
    let seq = Sequencer::new(paths);
    assert_eq!(seq.run().unwrap(), Outcome::NoConfig);
    assert!(!marker.exists());
}

#[test]
#[serial]
fn local_image_flashes_without_download() {
    let dir = tempfile::tempdir().unwrap();
    let (paths, marker) = paths_for(dir.path(), "Lightning shelf 1.2");
    let image = stage_local_image(dir.path(), "lightning_fw.bin");
    fs::write(
        &paths.config_file,
        r#"{"image": "lightning_fw.bin", "flash_num": 1}"#,
    )
    .unwrap();

    let seq = Sequencer::new(paths.clone());
    assert_eq!(seq.run().unwrap(), Outcome::Flashed);

    let args = fs::read_to_string(&marker).unwrap();
    assert_eq!(args.trim(), format!("1 {}", image.display()));
    // a matching platform keeps the config in place
    assert!(paths.config_file.exists());

    let log = fs::read_to_string(&paths.log_file).unwrap();
    assert!(log.contains("success: flashed:"));
    // MM/DD/YYYY HH:MM:SS prefix
    let line = log.lines().next().unwrap();
    let b = line.as_bytes();
    assert_eq!(b[2], b'/');
    assert_eq!(b[5], b'/');
    assert_eq!(b[10], b' ');
    assert_eq!(b[13], b':');
    assert_eq!(b[16], b':');
}

#[test]
#[serial]
fn platform_mismatch_deletes_config_and_never_flashes() {
    let dir = tempfile::tempdir().unwrap();
    let (paths, marker) = paths_for(dir.path(), "Delta powershelf 2.0");
    stage_local_image(dir.path(), "lightning_fw.bin");
    fs::write(
        &paths.config_file,
        r#"{"image": "lightning_fw.bin", "flash_num": 1}"#,
    )
    .unwrap();

    let seq = Sequencer::new(paths.clone());
    let err = seq.run().unwrap_err();
    assert!(matches!(err, ReimageError::PlatformMismatch));
    assert!(!paths.config_file.exists());
    assert!(!marker.exists());

    let log = fs::read_to_string(&paths.log_file).unwrap();
    assert!(log.contains("does not match the platform"));
}

#[test]
#[serial]
fn undetermined_platform_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let (paths, marker) = paths_for(dir.path(), "mystery shelf");
    stage_local_image(dir.path(), "lightning_fw.bin");
    fs::write(&paths.config_file, r#"{"image": "lightning_fw.bin"}"#).unwrap();

    let seq = Sequencer::new(paths.clone());
    let err = seq.run().unwrap_err();
    assert!(matches!(err, ReimageError::PlatformUnknown));
    assert!(!paths.config_file.exists());
    assert!(!marker.exists());
}

#[test]
#[serial]
fn corrupted_image_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let (paths, marker) = paths_for(dir.path(), "Lightning shelf 1.2");
    let image = stage_local_image(dir.path(), "lightning_fw.bin");
    // flip one byte after the sidecar was recorded
    let mut data = fs::read(&image).unwrap();
    data[0] ^= 0xff;
    fs::write(&image, data).unwrap();
    fs::write(&paths.config_file, r#"{"image": "lightning_fw.bin"}"#).unwrap();

    let seq = Sequencer::new(paths.clone());
    let err = seq.run().unwrap_err();
    assert!(matches!(err, ReimageError::ChecksumMismatch { .. }));
    assert!(!marker.exists());

    let log = fs::read_to_string(&paths.log_file).unwrap();
    assert!(log.contains("Checksum not matching"));
}

#[test]
#[serial]
fn low_memory_refuses_download() {
    let dir = tempfile::tempdir().unwrap();
    let (paths, marker) = paths_for(dir.path(), "Lightning shelf 1.2");
    fs::write(&paths.meminfo, "MemTotal: 247172 kB\nMemFree: 1024 kB\n").unwrap();
    fs::write(
        &paths.config_file,
        r#"{"image": "lightning_fw.bin", "image_folder_url": "http://127.0.0.1:9"}"#,
    )
    .unwrap();

    let seq = Sequencer::new(paths.clone());
    let err = seq.run().unwrap_err();
    assert!(matches!(err, ReimageError::LowMemory { free_kb: 1024 }));
    assert!(!marker.exists());

    let log = fs::read_to_string(&paths.log_file).unwrap();
    assert!(log.contains("No free memory"));
}

#[test]
#[serial]
fn remote_image_is_downloaded_verified_and_flashed() {
    let dir = tempfile::tempdir().unwrap();
    let (paths, marker) = paths_for(dir.path(), "Lightning shelf 1.2");

    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    thread::spawn(move || {
        for req in server.incoming_requests() {
            let digest = hex::encode(Md5::digest(IMAGE_BYTES));
            let response = if req.url().ends_with(".md5") {
                Response::from_string(format!("{digest}\n"))
            } else {
                Response::from_data(IMAGE_BYTES.to_vec())
            };
            let _ = req.respond(response);
        }
    });

    // stale copies that must be replaced by the download
    fs::write(dir.path().join("lightning_fw.bin"), b"stale junk").unwrap();
    fs::write(dir.path().join("lightning_fw.bin.md5"), "stale\n").unwrap();

    fs::write(
        &paths.config_file,
        format!(
            r#"{{"image": "lightning_fw.bin", "image_folder_url": "http://127.0.0.1:{port}", "flash_num": 0}}"#
        ),
    )
    .unwrap();

    let seq = Sequencer::new(paths.clone());
    assert_eq!(seq.run().unwrap(), Outcome::Flashed);
    assert_eq!(fs::read(dir.path().join("lightning_fw.bin")).unwrap(), IMAGE_BYTES);
    let args = fs::read_to_string(&marker).unwrap();
    assert!(args.trim().starts_with("0 "));
}

#[test]
#[serial]
fn failed_flash_logs_and_stops() {
    let dir = tempfile::tempdir().unwrap();
    let (mut paths, _) = paths_for(dir.path(), "Lightning shelf 1.2");
    paths.flash_cmd = write_script(dir.path(), "flash-upg-broken", "exit 2");
    stage_local_image(dir.path(), "lightning_fw.bin");
    fs::write(&paths.config_file, r#"{"image": "lightning_fw.bin"}"#).unwrap();

    let seq = Sequencer::new(paths.clone());
    let err = seq.run().unwrap_err();
    assert!(matches!(err, ReimageError::FlashFailed { .. }));

    let log = fs::read_to_string(&paths.log_file).unwrap();
    assert!(log.contains("failure: flashing failed:"));
}

#[test]
fn malformed_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (paths, marker) = paths_for(dir.path(), "Lightning shelf 1.2");
    fs::write(&paths.config_file, "{not json").unwrap();

    let seq = Sequencer::new(paths);
    let err = seq.run().unwrap_err();
    assert!(matches!(err, ReimageError::ConfigParse(_)));
    assert!(!marker.exists());
}
