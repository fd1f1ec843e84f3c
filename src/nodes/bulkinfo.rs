// CLASSIFICATION: COMMUNITY
// Filename: bulkinfo.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-01-14

//! One-shot aggregate of every shelf resource.
//!
//! `/api/sys/bulkinfo` exists for pollers that want the whole shelf in one
//! request instead of walking fifty-odd endpoints. It issues several tool
//! calls back to back, so each one runs under the timed adapter; a hung
//! tool costs at most [`TOOL_TIMEOUT`] instead of wedging the request.

use std::fs;
use std::time::Duration;

use log::warn;
use serde_json::{json, Value};

use crate::exec;
use crate::node::{Node, NodeError};
use crate::nodes::bmc::parse_cpu_usage;
use crate::nodes::efuse::parse_efuse_output;
use crate::nodes::fan::parse_fan_output;
use crate::nodes::meminfo::parse_meminfo;
use crate::nodes::psu::parse_psu_output;

/// Per-tool deadline within one bulk request.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(10);

/// Handler for the `/api/sys/bulkinfo` endpoint.
pub struct BulkinfoNode;

fn timed(program: &str, args: &[&str]) -> String {
    match exec::run_with_timeout(program, args, TOOL_TIMEOUT) {
        Ok(out) => out,
        Err(e) => {
            warn!("bulkinfo: {e}");
            String::new()
        }
    }
}

impl Node for BulkinfoNode {
    fn information(&self) -> Result<Value, NodeError> {
        let efuse = parse_efuse_output(&timed(exec::EFUSE_UTIL, &["all"]));
        let psu = parse_psu_output(&timed(exec::PSU_UTIL, &["all"]), Some(()));
        let fan = parse_fan_output(&timed(exec::FAN_UTIL, &[]));
        let mem = parse_meminfo(&fs::read_to_string("/proc/meminfo").unwrap_or_default());
        let cpu = parse_cpu_usage(&timed(exec::TOP, &["-b", "-n", "1"]));

        Ok(json!({
            "efuse": efuse,
            "psu": psu,
            "fan": fan,
            "system_usage": {
                "cpu": cpu,
                "memory": mem,
            },
        }))
    }
}
