// CLASSIFICATION: COMMUNITY
// Filename: inet.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-12-11

//! BMC network interface state scraped from `ip addr show eth0`.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::exec;
use crate::node::{Node, NodeError};

/// Handler for the `/api/sys/inet` endpoint.
pub struct InetNode;

impl Node for InetNode {
    fn information(&self) -> Result<Value, NodeError> {
        let out = exec::run(exec::IP, &["addr", "show", "eth0"])?;
        Ok(parse_inet_output(&out))
    }
}

/// Parse `ip addr show eth0` into the `inet info` list: MAC, IPv4, IPv6
/// addresses grouped by scope, plus LINK/PHY state from the flag list.
pub fn parse_inet_output(data: &str) -> Value {
    let mut result = Vec::new();

    let mac = data
        .split_once("link/ether ")
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .unwrap_or("UNDEFINED");
    result.push(json!({ "BMC MAC": mac }));

    let ip = data
        .split_once("inet ")
        .and_then(|(_, rest)| rest.split('/').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("UNDEFINED");
    result.push(json!({ "BMC IP": ip }));

    // group IPv6 addresses by scope keyword
    let mut scopes: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for chunk in data.split("inet6 ").skip(1) {
        let Some((addr, rest)) = chunk.split_once(" scope ") else {
            continue;
        };
        let Some(scope) = rest.split_whitespace().next() else {
            continue;
        };
        scopes
            .entry(scope.to_uppercase())
            .or_default()
            .push(addr.trim().to_owned());
    }
    if scopes.is_empty() {
        result.push(json!({ "BMC IPV6": "UNDEFINED" }));
    } else {
        let mut ipv6 = serde_json::Map::new();
        for (scope, addrs) in scopes {
            ipv6.insert(format!("BMC IPV6 {scope}"), json!(addrs));
        }
        result.push(Value::Object(ipv6));
    }

    let mut link = "DOWN";
    let mut phy = "DOWN";
    if let Some(flags) = data
        .split_once("eth0: <")
        .and_then(|(_, rest)| rest.split('>').next())
    {
        for flag in flags.split(',') {
            match flag {
                "UP" => link = "UP",
                "LOWER_UP" => phy = "UP",
                _ => {}
            }
        }
    }
    result.push(json!({ "LINK": link }));
    result.push(json!({ "PHY": phy }));

    json!({ "inet info": result })
}
