// CLASSIFICATION: COMMUNITY
// Filename: bmc.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-01-14

//! BMC system endpoint: uptime, kernel, CPU and memory usage, reboot.

use std::fs;

use log::info;
use serde_json::{json, Map, Value};

use crate::exec;
use crate::node::{action_name, Node, NodeError};
use crate::nodes::meminfo::parse_meminfo;

/// Handler for the `/api/sys/bmc` endpoint.
pub struct BmcNode;

impl Node for BmcNode {
    fn information(&self) -> Result<Value, NodeError> {
        let uptime = exec::run(exec::UPTIME, &[])?;
        let kernel_release = exec::run(exec::UNAME, &["-r"])?;
        let kernel_version = exec::run(exec::UNAME, &["-v"])?;
        let top = exec::run(exec::TOP, &["-b", "-n", "1"])?;
        let meminfo = fs::read_to_string("/proc/meminfo").unwrap_or_default();

        Ok(json!({
            "uptime": uptime.trim(),
            "kernel_version": format!("{} {}", kernel_release.trim(), kernel_version.trim()),
            "cpu_usage": parse_cpu_usage(&top),
            "memory": parse_meminfo(&meminfo),
        }))
    }

    fn actions(&self) -> Vec<String> {
        vec!["reboot".to_owned()]
    }

    fn do_action(&self, req: &Value) -> Result<Value, NodeError> {
        match action_name(req)? {
            "reboot" => {
                info!("reboot requested via REST");
                exec::run(exec::REBOOT, &[])?;
                Ok(json!({ "result": "success" }))
            }
            other => Err(NodeError::ActionNotSupported(other.to_owned())),
        }
    }
}

/// Extract the `CPU:` line from `top -b -n 1` output and break it into a
/// label -> fraction mapping.
pub fn parse_cpu_usage(top_output: &str) -> Value {
    match top_output.split_once("CPU:") {
        Some((_, rest)) => parse_usage_info(rest.lines().next().unwrap_or(""), "  "),
        None => json!({}),
    }
}

/// Parse busybox-style usage fields: `delimiter`-separated entries of the
/// form `<percent>% <label>`, reported as fractions of 1.0.
pub fn parse_usage_info(data: &str, delimiter: &str) -> Value {
    let mut usage = Map::new();
    for entry in data.split(delimiter) {
        let entry = entry.trim_start();
        let Some((head, label)) = entry.split_once(' ') else {
            continue;
        };
        if let Ok(pct) = head.trim_end_matches('%').parse::<f64>() {
            usage.insert(label.trim().to_owned(), json!(pct / 100.0));
        }
    }
    Value::Object(usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOP_OUTPUT: &str = "\
Mem: 160712K used, 86460K free, 0K shrd, 0K buff, 96288K cached
CPU:  12% usr   3% sys   0% nic  84% idle   0% io   0% irq   0% sirq
Load average: 0.08 0.03 0.05 1/93 29874
";

    #[test]
    fn parses_cpu_line() {
        let v = parse_cpu_usage(TOP_OUTPUT);
        assert_eq!(v["usr"], json!(0.12));
        assert_eq!(v["sys"], json!(0.03));
        assert_eq!(v["idle"], json!(0.84));
    }

    #[test]
    fn missing_cpu_line_is_empty() {
        assert_eq!(parse_cpu_usage("Mem: 1K used\n"), json!({}));
    }
}
