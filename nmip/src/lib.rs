//! NetworkManager execution module for the configuration-management agent.
//!
//! The agent hands this crate a nested `group -> key -> value` description of
//! a connection. The crate renders it into a keyfile under
//! `/etc/NetworkManager/system-connections/`, hardens its permissions and
//! drives `nmcli` to load, activate, deactivate or delete the connection.
//!
//! NOTE: Values are passed through verbatim. Validating addresses, routes or
//! DNS entries is left to NetworkManager itself, which rejects bad profiles
//! at load time.

pub mod config;
pub mod error;
pub mod process;

pub mod tasks {
    //! Task modules grouped by responsibility.

    pub mod network_connections; // keyfile profiles and nmcli lifecycle
}

pub use config::NmipConfig;
pub use error::{NmipError, Result};
pub use tasks::network_connections::{ConnectionProperties, NetworkConnections};

use serde::{Deserialize, Serialize};

/// Result dictionary handed back to the agent for every operation.
///
/// `retcode` 0 means success. Any other value is a failure class: 2 for a
/// missing `connection.id`, 1 for a profile NetworkManager refused to load,
/// or the exit code of the failing `nmcli` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub retcode: i32,
    pub comment: String,
}

impl OperationResult {
    pub fn success(comment: impl Into<String>) -> Self {
        Self {
            retcode: 0,
            comment: comment.into(),
        }
    }

    pub fn failure(retcode: i32, comment: impl Into<String>) -> Self {
        Self {
            retcode,
            comment: comment.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.retcode == 0
    }
}

/// JSON-in interface the agent dispatches through. `action` is the function
/// name the agent was asked to call, `params` its arguments.
pub trait TaskHandler: Send + Sync {
    /// Module name the agent addresses this handler by.
    fn name(&self) -> &'static str;

    /// Execute an imperative action with parameters. Failures NetworkManager
    /// reports in a controlled way come back as a non-zero
    /// [`OperationResult`]; everything else is an [`NmipError`].
    fn exec(&self, action: &str, params: &serde_json::Value) -> Result<OperationResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_result_serializes_as_agent_dictionary() {
        let res = OperationResult::success("eth0 up");
        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            serde_json::json!({"retcode": 0, "comment": "eth0 up"})
        );
        assert!(res.is_success());
        assert!(!OperationResult::failure(4, "nope").is_success());
    }
}
