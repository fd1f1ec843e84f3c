// CLASSIFICATION: COMMUNITY
// Filename: psu.rs v0.3
// Author: Lukas Bower
// Date Modified: 2025-12-09

//! PSU telemetry and power control via `psu_util` / `psu_on.sh`.

use log::warn;
use serde_json::{json, Map, Value};

use crate::exec;
use crate::node::{action_name, Node, NodeError};

pub const MIN_PSU_NUM: u32 = 1;
pub const MAX_PSU_NUM: u32 = 6;

/// Handler for one `/api/sys/psu<n>` endpoint.
pub struct PsuNode {
    num: u32,
}

impl PsuNode {
    pub fn new(num: u32) -> Self {
        Self { num }
    }
}

impl Node for PsuNode {
    fn information(&self) -> Result<Value, NodeError> {
        if !(MIN_PSU_NUM..=MAX_PSU_NUM).contains(&self.num) {
            return Ok(json!({}));
        }
        let out = exec::run(exec::PSU_UTIL, &[&self.num.to_string()])?;
        Ok(parse_psu_output(&out, None))
    }

    fn actions(&self) -> Vec<String> {
        vec!["power-on".to_owned()]
    }

    fn do_action(&self, req: &Value) -> Result<Value, NodeError> {
        let action = action_name(req)?;
        if action != "power-on" {
            return Err(NodeError::ActionNotSupported(action.to_owned()));
        }
        let out = exec::run(exec::PSU_ON, &[&self.num.to_string()])?;
        let res = if out.contains("Usage:") || out.contains("fail ") {
            "failed"
        } else if out.contains("Turning on") {
            "success"
        } else {
            "not a valid action"
        };
        Ok(json!({ "result": res }))
    }
}

/// Parse `psu_util` output.
///
/// With `aggregate` set (the `psu_util all` form), the text carries a
/// trailing `PSU Summary` section with shelf-level totals; otherwise the
/// whole text is per-PSU blocks introduced by `info for PSU <n>:`.
/// `temperature<N>` keys are folded into one nested `temperature` object,
/// `operation_state` stays a string and everything else is numeric.
pub fn parse_psu_output(data: &str, aggregate: Option<()>) -> Value {
    let mut info = Map::new();

    let (psu_part, aggregate_part) = if aggregate.is_some() {
        match data.split_once("========= PSU Summary =======") {
            Some((head, tail)) => {
                let tail = tail.split_once('\n').map(|(_, t)| t).unwrap_or("");
                (head, Some(tail))
            }
            None => return Value::Object(info),
        }
    } else {
        (data, None)
    };

    for block in psu_part.split("info for PSU ") {
        let Some((num, rest)) = block.split_once(':') else {
            continue;
        };
        let mut psu = Map::new();
        let mut temps = Map::new();
        for line in rest.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if let Some(temp_num) = key.trim().strip_prefix("temperature") {
                if let Ok(t) = value.parse::<i64>() {
                    temps.insert(temp_num.to_owned(), json!(t));
                }
            } else if key.contains("operation_state") {
                psu.insert(key.trim().to_owned(), json!(value));
            } else if let Ok(f) = value.parse::<f64>() {
                psu.insert(key.trim().to_owned(), json!(f));
            } else {
                warn!("psu {}: unparsable field {:?}", num, key.trim());
            }
        }
        psu.insert("temperature".into(), Value::Object(temps));
        info.insert(num.to_owned(), Value::Object(psu));
    }

    if let Some(agg) = aggregate_part {
        let mut totals = Map::new();
        for line in agg.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            if let Ok(f) = value.trim().parse::<f64>() {
                totals.insert(key.trim().to_owned(), json!(f));
            }
        }
        let mut aggregate_info = Map::new();
        for key in ["total_power", "side_a_power", "side_b_power", "total_current"] {
            if let Some(v) = totals.get(key) {
                aggregate_info.insert(key.to_owned(), v.clone());
            }
        }
        info.insert("aggregate".into(), Value::Object(aggregate_info));
    }

    Value::Object(info)
}
