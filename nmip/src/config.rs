//! Runtime settings for the connection tasks.
//!
//! The defaults target a stock NetworkManager install. A JSON file can
//! override any of them; the binary additionally lets flags override the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{NmipError, Result};

/// Directory NetworkManager's keyfile plugin reads system connections from.
pub const DEFAULT_CONNECTIONS_DIR: &str = "/etc/NetworkManager/system-connections";

/// Name of the NetworkManager control tool.
pub const DEFAULT_NMCLI: &str = "nmcli";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NmipConfig {
    /// Where `<id>.nmconnection` profiles are written.
    pub connections_dir: PathBuf,
    /// Program (plus any leading arguments) invoked as nmcli.
    pub nmcli: Vec<String>,
    /// Owner applied to written profiles.
    pub owner_uid: u32,
    pub owner_gid: u32,
}

impl Default for NmipConfig {
    fn default() -> Self {
        Self {
            connections_dir: PathBuf::from(DEFAULT_CONNECTIONS_DIR),
            nmcli: vec![DEFAULT_NMCLI.to_string()],
            owner_uid: 0,
            owner_gid: 0,
        }
    }
}

impl NmipConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| NmipError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|reason| NmipError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        let config: NmipConfig = serde_json::from_str(content).map_err(|e| e.to_string())?;
        if config.nmcli.is_empty() {
            return Err("nmcli must name a program".to_string());
        }
        Ok(config)
    }

    pub fn with_connections_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.connections_dir = dir.into();
        self
    }

    pub fn with_nmcli<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nmcli = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_owner(mut self, uid: u32, gid: u32) -> Self {
        self.owner_uid = uid;
        self.owner_gid = gid;
        self
    }

    /// Full argv for an `nmcli connection <subcommand> <arg>` invocation.
    pub(crate) fn nmcli_argv(&self, subcommand: &str, arg: &str) -> Vec<String> {
        let mut argv = self.nmcli.clone();
        argv.extend(["connection".to_string(), subcommand.to_string(), arg.to_string()]);
        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_target_networkmanager() {
        let config = NmipConfig::default();
        assert_eq!(
            config.connections_dir,
            PathBuf::from("/etc/NetworkManager/system-connections")
        );
        assert_eq!(config.nmcli, vec!["nmcli"]);
        assert_eq!((config.owner_uid, config.owner_gid), (0, 0));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"connections_dir": "/tmp/conns"}"#).unwrap();

        let config = NmipConfig::from_file(file.path()).unwrap();
        assert_eq!(config.connections_dir, PathBuf::from("/tmp/conns"));
        assert_eq!(config.nmcli, vec!["nmcli"]);
    }

    #[test]
    fn test_rejects_unknown_and_empty_fields() {
        assert!(NmipConfig::from_json(r#"{"bogus": 1}"#).is_err());
        assert!(NmipConfig::from_json(r#"{"nmcli": []}"#).is_err());
    }

    #[test]
    fn test_nmcli_argv_keeps_leading_args() {
        let config = NmipConfig::default().with_nmcli(["/bin/sh", "/tmp/fake"]);
        assert_eq!(
            config.nmcli_argv("up", "eth0"),
            vec!["/bin/sh", "/tmp/fake", "connection", "up", "eth0"]
        );
    }
}
