// CLASSIFICATION: COMMUNITY
// Filename: fruid.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-12-04

//! FRU identity from the shelf EEPROM dump.

use serde_json::{json, Map, Value};

use crate::exec;
use crate::node::{Node, NodeError};

/// Handler for the `/api/sys/fruid` endpoint.
pub struct FruidNode;

impl Node for FruidNode {
    fn information(&self) -> Result<Value, NodeError> {
        let out = exec::run(exec::EEPROM, &[])?;
        Ok(parse_eeprom_output(&out))
    }
}

/// Parse `eeprom.sh` key/value lines, skipping the banner line.
/// Keys are lowercased with spaces folded to underscores.
pub fn parse_eeprom_output(data: &str) -> Value {
    let mut info = Map::new();
    let body = data.split_once('\n').map(|(_, t)| t).unwrap_or("");
    for line in body.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase().replace(' ', "_");
        info.insert(key, json!(value.trim()));
    }
    Value::Object(info)
}
