//! NetworkManager connection profiles and their lifecycle.
//!
//! The agent calls into [`NetworkConnections`] either directly or through
//! [`crate::TaskHandler::exec`] with the function name as action:
//!
//! - `define_connection` / `configure_connection` take the properties object,
//!   e.g. `{"connection": {"id": "main", "type": "ethernet"}, "ipv4": {...}}`
//! - `up_connection` / `down_connection` / `delete_connection` take the
//!   connection id, either as a bare string or `{"connection_id": "main"}`

use serde_json::Value;

mod nmcli;
pub mod profile;
mod properties;

pub use nmcli::NetworkConnections;
pub use properties::ConnectionProperties;

use crate::error::{NmipError, Result};
use crate::OperationResult;

/// Name the agent addresses this module by.
pub const MODULE_NAME: &str = "nmip";

impl crate::TaskHandler for NetworkConnections {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn exec(&self, action: &str, params: &Value) -> Result<OperationResult> {
        match action {
            "define_connection" => self.define_connection(&ConnectionProperties::from_value(params)?),
            "configure_connection" => {
                self.configure_connection(&ConnectionProperties::from_value(params)?)
            }
            "up_connection" => self.up_connection(connection_id(action, params)?),
            "down_connection" => self.down_connection(connection_id(action, params)?),
            "delete_connection" => self.delete_connection(connection_id(action, params)?),
            other => Err(NmipError::UnknownAction(other.to_string())),
        }
    }
}

fn connection_id<'a>(action: &str, params: &'a Value) -> Result<&'a str> {
    let id = match params {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("connection_id").and_then(Value::as_str),
        _ => None,
    };
    id.ok_or_else(|| NmipError::InvalidParams {
        action: action.to_string(),
        reason: "expected a connection id string or {\"connection_id\": \"...\"}".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskHandler;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_connection_id_forms() {
        assert_eq!(connection_id("up_connection", &json!("eth0")).unwrap(), "eth0");
        assert_eq!(
            connection_id("up_connection", &json!({"connection_id": "eth1"})).unwrap(),
            "eth1"
        );
        assert_matches!(
            connection_id("up_connection", &json!({"id": "eth1"})),
            Err(NmipError::InvalidParams { action, .. }) if action == "up_connection"
        );
        assert_matches!(
            connection_id("down_connection", &json!(3)),
            Err(NmipError::InvalidParams { .. })
        );
    }

    #[test]
    fn test_unknown_action() {
        let handler = NetworkConnections::default();
        assert_eq!(handler.name(), "nmip");
        assert_matches!(
            handler.exec("reload_connection", &json!("eth0")),
            Err(NmipError::UnknownAction(a)) if a == "reload_connection"
        );
    }

    #[test]
    fn test_define_without_id_never_touches_disk() {
        let handler = NetworkConnections::default();
        let res = handler
            .exec("define_connection", &json!({"ipv4": {"method": "auto"}}))
            .unwrap();
        assert_eq!(res, OperationResult::failure(2, "connection.id is required"));
    }

    #[test]
    fn test_render_connection() {
        let handler = NetworkConnections::default();
        let props = ConnectionProperties::from_value(&json!({"connection": {"id": "lan0"}})).unwrap();
        let (path, text) = handler.render_connection(&props).unwrap();
        assert_eq!(
            path,
            std::path::PathBuf::from("/etc/NetworkManager/system-connections/lan0.nmconnection")
        );
        assert_eq!(text, "[connection]\nid=lan0\n");
        assert!(handler.render_connection(&ConnectionProperties::new()).is_none());
    }
}
