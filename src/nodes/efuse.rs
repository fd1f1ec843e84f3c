// CLASSIFICATION: COMMUNITY
// Filename: efuse.rs v0.3
// Author: Lukas Bower
// Date Modified: 2025-12-09

//! eFuse telemetry and switching via `eFuse-util`.

use serde_json::{json, Map, Value};

use crate::exec;
use crate::node::{action_name, Node, NodeError};

pub const MIN_EFUSE_NUM: u32 = 1;
pub const MAX_EFUSE_NUM: u32 = 50;

/// Handler for one `/api/sys/efuses/efuse<n>` endpoint.
pub struct EfuseNode {
    num: u32,
}

impl EfuseNode {
    pub fn new(num: u32) -> Self {
        Self { num }
    }
}

impl Node for EfuseNode {
    fn information(&self) -> Result<Value, NodeError> {
        if !(MIN_EFUSE_NUM..=MAX_EFUSE_NUM).contains(&self.num) {
            return Ok(json!({}));
        }
        let out = exec::run(exec::EFUSE_UTIL, &[&self.num.to_string()])?;
        Ok(parse_efuse_output(&out))
    }

    fn actions(&self) -> Vec<String> {
        vec!["power-on".to_owned(), "power-off".to_owned(), "reset".to_owned()]
    }

    fn do_action(&self, req: &Value) -> Result<Value, NodeError> {
        let flag = match action_name(req)? {
            "power-on" => "--on",
            "power-off" => "--off",
            "reset" => "--reset",
            other => return Err(NodeError::ActionNotSupported(other.to_owned())),
        };
        let out = exec::run(exec::EFUSE_UTIL, &[&self.num.to_string(), flag])?;
        let res = if out.contains("Usage:") || out.contains("fail ") {
            "failed"
        } else {
            "success"
        };
        Ok(json!({ "result": res }))
    }
}

/// Handler for the `/api/sys/efuses/efuseall` summary endpoint.
pub struct EfuseAllNode;

impl Node for EfuseAllNode {
    fn information(&self) -> Result<Value, NodeError> {
        let out = exec::run(exec::EFUSE_UTIL_SH, &["all"])?;
        Ok(json!({ "eFuse info": parse_efuse_summary(&out) }))
    }

    fn actions(&self) -> Vec<String> {
        vec!["power-on".to_owned(), "power-off".to_owned()]
    }

    fn do_action(&self, req: &Value) -> Result<Value, NodeError> {
        let program = match action_name(req)? {
            "power-on" => exec::EFUSE_ON,
            "power-off" => exec::EFUSE_OFF,
            other => return Err(NodeError::ActionNotSupported(other.to_owned())),
        };
        let out = exec::run(program, &["all"])?;
        let res = if out.contains("Success") {
            "success"
        } else {
            "some eFuses failed to switch"
        };
        Ok(json!({ "result": res }))
    }
}

/// Parse `eFuse-util` output into per-eFuse mappings.
///
/// Blocks are introduced by `info for eFuse <n>:`; within a block, `state`
/// stays a string and every other field is numeric. Works for both the
/// single-eFuse and the `all` form.
pub fn parse_efuse_output(data: &str) -> Value {
    let mut info = Map::new();
    for block in data.split("info for eFuse ") {
        let Some((num, rest)) = block.split_once(':') else {
            continue;
        };
        let Some((_, body)) = rest.split_once('\n') else {
            continue;
        };
        let mut efuse = Map::new();
        for line in body.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if key.trim() == "state" {
                efuse.insert(key.trim().to_owned(), json!(value));
            } else if let Ok(f) = value.parse::<f64>() {
                efuse.insert(key.trim().to_owned(), json!(f));
            }
        }
        info.insert(num.to_owned(), Value::Object(efuse));
    }
    Value::Object(info)
}

/// Parse the `eFuse-util.sh all` one-line-per-field summary, dropping the
/// leading banner line.
pub fn parse_efuse_summary(data: &str) -> Value {
    let mut result = Map::new();
    let body = data.split_once('\n').map(|(_, t)| t).unwrap_or("");
    for line in body.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        result.insert(key.trim().to_owned(), json!(value.trim()));
    }
    Value::Object(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_EFUSES: &str = "\
info for eFuse 7:
  state: on
  input_voltage: 12.02
  output_current: 3.6
  power: 43.3
info for eFuse 8:
  state: off
  input_voltage: 12.01
  output_current: 0.0
  power: 0.0
";

    #[test]
    fn parses_numbered_blocks() {
        let v = parse_efuse_output(TWO_EFUSES);
        assert_eq!(v["7"]["state"], json!("on"));
        assert_eq!(v["7"]["input_voltage"], json!(12.02));
        assert_eq!(v["8"]["state"], json!("off"));
        assert_eq!(v["8"]["power"], json!(0.0));
    }

    #[test]
    fn ignores_text_before_first_block() {
        let v = parse_efuse_output("eFuse status report\ninfo for eFuse 1:\n  state: on\n");
        assert_eq!(v["1"]["state"], json!("on"));
        assert_eq!(v.as_object().unwrap().len(), 1);
    }

    #[test]
    fn summary_drops_banner_line() {
        let out = "eFuse summary for shelf\n total: 50\n on: 48\n off: 2\n";
        let v = parse_efuse_summary(out);
        assert_eq!(v["total"], json!("50"));
        assert_eq!(v["on"], json!("48"));
        assert_eq!(v["off"], json!("2"));
    }
}
