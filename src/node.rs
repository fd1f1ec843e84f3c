// CLASSIFICATION: COMMUNITY
// Filename: node.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-11-18

//! Handler capability carried by every resource tree entry.
//!
//! A [`Node`] answers `GET` requests through [`Node::information`] and
//! [`Node::actions`], and `POST` requests through [`Node::do_action`].
//! Handlers are stateless: each call re-queries the hardware, so there is
//! no staleness to manage and no cache to invalidate.

use serde_json::Value;
use thiserror::Error;

use crate::exec::ExecError;

/// Errors surfaced by node handlers.
///
/// The router contains these per request: a failing handler degrades to an
/// empty mapping or `{"result": "failed"}`, never a process exit.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("action {0:?} not supported")]
    ActionNotSupported(String),
    #[error("missing \"action\" field in request")]
    MissingAction,
}

/// Capability contract implemented by every resource kind.
pub trait Node: Send + Sync {
    /// Current state of the resource, re-queried from hardware.
    fn information(&self) -> Result<Value, NodeError>;

    /// Names of the actions this resource accepts via `POST`.
    fn actions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Perform one action described by the request body.
    fn do_action(&self, req: &Value) -> Result<Value, NodeError> {
        let action = action_name(req)?;
        Err(NodeError::ActionNotSupported(action.to_owned()))
    }
}

/// Pull the `action` string out of a `POST` body.
pub fn action_name(req: &Value) -> Result<&str, NodeError> {
    req.get("action")
        .and_then(Value::as_str)
        .ok_or(NodeError::MissingAction)
}

/// Structural node with no information or actions of its own.
///
/// Used for interior endpoints such as `/api` and `/api/sys` that exist
/// only to list their child resources.
pub struct StructNode;

impl Node for StructNode {
    fn information(&self) -> Result<Value, NodeError> {
        Ok(Value::Object(serde_json::Map::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn struct_node_is_empty() {
        let n = StructNode;
        assert_eq!(n.information().unwrap(), json!({}));
        assert!(n.actions().is_empty());
    }

    #[test]
    fn default_do_action_rejects() {
        let n = StructNode;
        let err = n.do_action(&json!({"action": "reboot"})).unwrap_err();
        assert!(matches!(err, NodeError::ActionNotSupported(a) if a == "reboot"));
    }

    #[test]
    fn missing_action_field() {
        let n = StructNode;
        let err = n.do_action(&json!({"foo": 1})).unwrap_err();
        assert!(matches!(err, NodeError::MissingAction));
    }
}
