// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-02-27

//! BMC utility library for OpenBMC powershelf platforms.
//!
//! Two loosely related pieces live here:
//!
//! * the REST resource tree ([`tree`], [`node`], [`server`]) that exposes
//!   hardware telemetry over HTTP by shelling out to the platform `*-util`
//!   tools and republishing their output as JSON;
//! * the firmware install sequencers ([`reimage`], [`installer`]) behind the
//!   `reimage` and `bmc-installer` binaries.
//!
//! The tree is built once at startup by [`plat::init_plat_tree`] and is
//! read-only afterwards; every handler call re-queries the hardware.

pub mod auth;
pub mod exec;
pub mod installer;
pub mod node;
pub mod nodes;
pub mod plat;
pub mod reimage;
pub mod server;
pub mod tree;
