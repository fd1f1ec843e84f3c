// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-12-04

//! Per-resource REST handlers.
//!
//! One module per hardware resource kind. Each pairs a [`crate::node::Node`]
//! implementation (which shells out through [`crate::exec`]) with the text
//! parser for that tool's output. Parsers operate on plain `&str` so they
//! can be unit-tested against captured tool output without hardware.

pub mod bmc;
pub mod bulkinfo;
pub mod efuse;
pub mod fan;
pub mod fruid;
pub mod inet;
pub mod meminfo;
pub mod psu;
pub mod swver;
