// CLASSIFICATION: COMMUNITY
// Filename: fan.rs v0.3
// Author: Lukas Bower
// Date Modified: 2025-12-04

//! Fan bank telemetry from `fan-util.sh`.

use serde_json::{json, Map, Value};

use crate::exec;
use crate::node::{Node, NodeError};

/// Handler for the `/api/sys/fan` endpoint.
pub struct FanNode;

impl Node for FanNode {
    fn information(&self) -> Result<Value, NodeError> {
        let out = exec::run(exec::FAN_UTIL, &[])?;
        Ok(parse_fan_output(&out))
    }
}

/// First whitespace-delimited token after `marker`, if any.
fn token_after<'a>(data: &'a str, marker: &str) -> Option<&'a str> {
    data.split_once(marker)?
        .1
        .trim_start()
        .split_whitespace()
        .next()
}

/// Rest of the line following `marker`, if any.
fn line_after<'a>(data: &'a str, marker: &str) -> Option<&'a str> {
    let rest = data.split_once(marker)?.1;
    Some(rest.lines().next().unwrap_or("").trim())
}

/// Parse `fan-util.sh` output into per-fan mappings.
///
/// Fans are numbered 1-4. The fault/warning/status lines are reported once
/// for the whole bank and repeated under every fan, matching the shape the
/// shelf controllers have always published.
pub fn parse_fan_output(data: &str) -> Value {
    let mut info = Map::new();
    for i in 1..=4 {
        let mut fan = Map::new();

        let temp = token_after(data, &format!("temperature{i}:"))
            .and_then(|t| t.parse::<f64>().ok())
            .map(|v| json!(v))
            .unwrap_or_else(|| json!(""));
        fan.insert("temperature".into(), temp);

        let speed = token_after(data, &format!("fan{i} speed:"))
            .and_then(|t| t.parse::<i64>().ok())
            .map(|v| json!(v))
            .unwrap_or_else(|| json!(""));
        fan.insert("speed".into(), speed);

        if let Some(v) = line_after(data, "fan_fault:") {
            fan.insert("fan_fault".into(), json!(v));
        }
        if let Some(v) = line_after(data, "fan_warning:") {
            fan.insert("fan_warning".into(), json!(v));
        }
        if let Some(v) = line_after(data, "fan_status:") {
            fan.insert("fan_status".into(), json!(v));
        }

        info.insert(i.to_string(), Value::Object(fan));
    }
    Value::Object(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAN_OUTPUT: &str = "\
temperature1: 32.5 C
fan1 speed: 9800 RPM
temperature2: 31.0 C
fan2 speed: 9750 RPM
temperature3: 33.25 C
fan3 speed: 9900 RPM
temperature4: 30.5 C
fan4 speed: 9650 RPM
fan_fault: none
fan_warning: none
fan_status: ok
";

    #[test]
    fn parses_all_four_fans() {
        let v = parse_fan_output(FAN_OUTPUT);
        assert_eq!(v["1"]["temperature"], json!(32.5));
        assert_eq!(v["1"]["speed"], json!(9800));
        assert_eq!(v["3"]["temperature"], json!(33.25));
        assert_eq!(v["4"]["speed"], json!(9650));
        assert_eq!(v["2"]["fan_fault"], json!("none"));
        assert_eq!(v["4"]["fan_status"], json!("ok"));
    }

    #[test]
    fn missing_fan_yields_empty_fields() {
        let v = parse_fan_output("temperature1: 30 C\nfan1 speed: 9000 RPM\n");
        assert_eq!(v["2"]["temperature"], json!(""));
        assert_eq!(v["2"]["speed"], json!(""));
        assert!(v["2"].get("fan_fault").is_none());
    }
}
