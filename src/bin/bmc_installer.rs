// CLASSIFICATION: COMMUNITY
// Filename: bmc_installer.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-02-27

//! Interactive BMC image installer CLI.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use bmcutil::installer::{install, InstallTools, DEFAULT_IMAGE_PATH};

#[derive(Parser)]
#[command(about = "Download, verify and flash a BMC image")]
struct Cli {
    /// URL of the image; its .md5 sidecar must sit next to it.
    url: String,
    /// Skip the confirmation prompt.
    #[arg(short = 'y')]
    yes: bool,
}

fn confirmed() -> bool {
    println!("Will program the flash, want to continue? (Y/N)?");
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.yes && !confirmed() {
        exit(1);
    }

    let image_path = PathBuf::from(DEFAULT_IMAGE_PATH);
    if let Err(e) = install(&cli.url, &image_path, &InstallTools::default()) {
        eprintln!("{e}");
        exit(e.exit_code());
    }
}
