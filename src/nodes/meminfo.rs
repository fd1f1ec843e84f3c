// CLASSIFICATION: COMMUNITY
// Filename: meminfo.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-12-04

//! Memory usage summary from `/proc/meminfo`.

use std::fs;

use serde_json::{json, Map, Value};

use crate::node::{Node, NodeError};

const MEMINFO: &str = "/proc/meminfo";

/// Handler for the `/api/sys/meminfo` endpoint.
pub struct MeminfoNode;

impl Node for MeminfoNode {
    fn information(&self) -> Result<Value, NodeError> {
        let data = fs::read_to_string(MEMINFO).unwrap_or_default();
        Ok(parse_meminfo(&data))
    }
}

/// Reduce `/proc/meminfo` to the four fields the shelf dashboards use.
/// Kernel values are kB; the REST payload reports bytes.
pub fn parse_meminfo(data: &str) -> Value {
    let mut fields = Map::new();
    for line in data.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Some(kb) = value.trim_start().split_whitespace().next() else {
            continue;
        };
        if let Ok(kb) = kb.parse::<u64>() {
            fields.insert(key.trim().to_lowercase(), json!(kb * 1024));
        }
    }

    let mut out = Map::new();
    for (dst, src) in [
        ("mem_total", "memtotal"),
        ("mem_available", "memavailable"),
        ("mem_free", "memfree"),
        ("swap_total", "swaptotal"),
    ] {
        if let Some(v) = fields.get(src) {
            out.insert(dst.to_owned(), v.clone());
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO_SAMPLE: &str = "\
MemTotal:         247172 kB
MemFree:           86460 kB
MemAvailable:     176548 kB
Buffers:               0 kB
Cached:            96288 kB
SwapTotal:              0 kB
";

    #[test]
    fn converts_kb_to_bytes() {
        let v = parse_meminfo(MEMINFO_SAMPLE);
        assert_eq!(v["mem_total"], json!(247172u64 * 1024));
        assert_eq!(v["mem_free"], json!(86460u64 * 1024));
        assert_eq!(v["mem_available"], json!(176548u64 * 1024));
        assert_eq!(v["swap_total"], json!(0));
        // untracked fields stay out of the payload
        assert!(v.get("cached").is_none());
    }

    #[test]
    fn tolerates_missing_fields() {
        let v = parse_meminfo("MemTotal: 1024 kB\n");
        assert_eq!(v["mem_total"], json!(1024 * 1024));
        assert!(v.get("mem_free").is_none());
    }
}
