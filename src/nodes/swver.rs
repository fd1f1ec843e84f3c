// CLASSIFICATION: COMMUNITY
// Filename: swver.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-12-04

//! BMC software version and identity endpoint.

use serde_json::{json, Value};

use crate::exec;
use crate::node::{Node, NodeError};

/// Handler for the `/api/sys/swVersion` endpoint.
pub struct SwverNode;

impl Node for SwverNode {
    fn information(&self) -> Result<Value, NodeError> {
        let version = exec::run(exec::SW_VERSION, &[])?;
        let bmc_id = exec::run(exec::BMC_ID, &[])?;
        Ok(json!({
            "BMC software Version": version.trim(),
            "BMC identity": bmc_id.trim(),
        }))
    }
}
