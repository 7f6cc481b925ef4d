use std::path::PathBuf;

use tracing::{error, info, warn};

use super::profile::{profile_path, write_profile};
use super::ConnectionProperties;
use crate::config::NmipConfig;
use crate::error::{NmipError, Result};
use crate::process::run_capture;
use crate::OperationResult;

/// What nmcli prints on stderr when NetworkManager rejects a keyfile.
/// nmcli may still exit 0 in that case.
const LOAD_REJECTED: &str = "Could not load file";

/// Keyfile profiles plus the nmcli calls that drive them.
///
/// Every operation blocks until nmcli exits. Nothing is locked: two callers
/// working on the same id race at the file system and in NetworkManager.
#[derive(Debug, Clone, Default)]
pub struct NetworkConnections {
    config: NmipConfig,
}

impl NetworkConnections {
    pub fn new(config: NmipConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NmipConfig {
        &self.config
    }

    /// Write the profile for `properties` and load it into NetworkManager.
    ///
    /// A profile NetworkManager refuses stays on disk.
    pub fn define_connection(&self, properties: &ConnectionProperties) -> Result<OperationResult> {
        let Some(id) = properties.id() else {
            return Ok(OperationResult::failure(2, "connection.id is required"));
        };

        let path = profile_path(&self.config, id);
        write_profile(&self.config, &path, properties)?;

        let argv = self.config.nmcli_argv("load", &path.to_string_lossy());
        let out = run_capture(&argv)?;
        if out.stderr.contains(LOAD_REJECTED) {
            warn!(id, stderr = %out.stderr.trim_end(), "NetworkManager rejected profile");
            return Ok(OperationResult::failure(
                1,
                format!(
                    "connection {} failed, likely due to invalid connection properties",
                    id
                ),
            ));
        }
        if !out.success() {
            error!(id, code = out.code(), stderr = %out.stderr.trim_end(), "nmcli connection load failed");
            return Ok(OperationResult::failure(
                out.code(),
                format!("connection {} failed loading", id),
            ));
        }

        info!(id, path = %path.display(), "connection defined");
        Ok(OperationResult::success(format!("connection {} defined", id)))
    }

    /// Activate a connection NetworkManager already knows about.
    pub fn up_connection(&self, connection_id: &str) -> Result<OperationResult> {
        let out = run_capture(&self.config.nmcli_argv("up", connection_id))?;
        if !out.success() {
            let stderr = out.stderr.trim_end();
            error!(id = connection_id, code = out.code(), stderr, "nmcli connection up failed");
            return Ok(OperationResult::failure(
                out.code(),
                format!(
                    "connection {} failed to start, stderr: {}",
                    connection_id, stderr
                ),
            ));
        }
        info!(id = connection_id, "connection up");
        Ok(OperationResult::success(format!("{} up", connection_id)))
    }

    /// Deactivate a connection. A failing nmcli is not turned into a result:
    /// it surfaces as [`NmipError::Unrecovered`].
    pub fn down_connection(&self, connection_id: &str) -> Result<OperationResult> {
        self.run_checked("down", connection_id)?;
        info!(id = connection_id, "connection down");
        Ok(OperationResult::success(format!("{} down", connection_id)))
    }

    /// Delete a connection from NetworkManager, which also removes its
    /// profile. Failures surface as [`NmipError::Unrecovered`].
    pub fn delete_connection(&self, connection_id: &str) -> Result<OperationResult> {
        self.run_checked("delete", connection_id)?;
        info!(id = connection_id, "connection deleted");
        Ok(OperationResult::success(format!("{} deleted", connection_id)))
    }

    /// Define the connection, then bring it up.
    ///
    /// Known issue: a non-zero result from either step is logged and then
    /// discarded, the call still reports `<id> configured`. Callers that
    /// need the outcome should call the two steps themselves. Only a missing
    /// `connection.id` and hard errors are reported.
    pub fn configure_connection(&self, properties: &ConnectionProperties) -> Result<OperationResult> {
        let Some(id) = properties.id() else {
            return Ok(OperationResult::failure(2, "connection.id is required"));
        };

        let defined = self.define_connection(properties)?;
        if !defined.is_success() {
            warn!(id, retcode = defined.retcode, comment = %defined.comment, "ignoring define failure");
        }
        let up = self.up_connection(id)?;
        if !up.is_success() {
            warn!(id, retcode = up.retcode, comment = %up.comment, "ignoring up failure");
        }

        Ok(OperationResult::success(format!("{} configured", id)))
    }

    /// Keyfile text and target path for `properties`, without touching the
    /// disk or NetworkManager.
    pub fn render_connection(&self, properties: &ConnectionProperties) -> Option<(PathBuf, String)> {
        let id = properties.id()?;
        Some((profile_path(&self.config, id), properties.to_keyfile()))
    }

    fn run_checked(&self, subcommand: &str, connection_id: &str) -> Result<()> {
        let argv = self.config.nmcli_argv(subcommand, connection_id);
        let out = run_capture(&argv)?;
        if !out.success() {
            return Err(NmipError::Unrecovered {
                command: argv,
                code: out.code(),
                stderr: out.stderr.trim_end().to_string(),
            });
        }
        Ok(())
    }
}
