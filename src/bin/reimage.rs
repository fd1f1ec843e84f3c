// CLASSIFICATION: COMMUNITY
// Filename: reimage.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-02-27

//! Reimage sequencer CLI: runs the pipeline against the config file
//! dropped at /home/root/reimage.json, if any.

use std::process::exit;

use bmcutil::reimage::{ReimagePaths, Sequencer};

fn main() {
    env_logger::init();
    let sequencer = Sequencer::new(ReimagePaths::default());
    match sequencer.run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{e}");
            exit(1);
        }
    }
}
