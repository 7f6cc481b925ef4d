//! Keyfile profiles on disk.
//!
//! Profiles are owned by the configured owner (root:root) with mode 0600.
//! NetworkManager refuses to load keyfiles other users can read.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{chown, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::ConnectionProperties;
use crate::config::NmipConfig;
use crate::error::{NmipError, Result};

pub const PROFILE_EXTENSION: &str = "nmconnection";
pub const PROFILE_MODE: u32 = 0o600;

/// `<connections_dir>/<id>.nmconnection`. The id is used verbatim.
pub fn profile_path(config: &NmipConfig, id: &str) -> PathBuf {
    config
        .connections_dir
        .join(format!("{}.{}", id, PROFILE_EXTENSION))
}

/// Write `properties` to `path`, replacing any previous content, then
/// restrict it to the configured owner.
pub fn write_profile(config: &NmipConfig, path: &Path, properties: &ConnectionProperties) -> Result<()> {
    let io_err = |source: io::Error| NmipError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = temp_path(path);
    let written = write_restricted(&tmp, properties.to_keyfile().as_bytes())
        .and_then(|_| fs::set_permissions(&tmp, fs::Permissions::from_mode(PROFILE_MODE)))
        .and_then(|_| chown(&tmp, Some(config.owner_uid), Some(config.owner_gid)))
        .and_then(|_| fs::rename(&tmp, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }

    debug!(
        path = %path.display(),
        uid = config.owner_uid,
        gid = config.owner_gid,
        "wrote connection profile"
    );
    Ok(())
}

// The file never exists with a wider mode than 0600, so the profile content
// is not readable by other users between write and chmod.
fn write_restricted(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut f = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(PROFILE_MODE)
        .open(path)?;
    f.write_all(data)?;
    f.sync_all()
}

// Hidden and without the .nmconnection suffix so NetworkManager never picks
// up a half-written profile.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> NmipConfig {
        let md = fs::metadata(dir.path()).unwrap();
        NmipConfig::default()
            .with_connections_dir(dir.path())
            .with_owner(md.uid(), md.gid())
    }

    #[test]
    fn test_profile_path_uses_id_verbatim() {
        let config = NmipConfig::default();
        assert_eq!(
            profile_path(&config, "Wired connection 1"),
            PathBuf::from("/etc/NetworkManager/system-connections/Wired connection 1.nmconnection")
        );
    }

    #[test]
    fn test_write_sets_mode_and_content() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);
        let mut props = ConnectionProperties::new();
        props.set("connection", "id", "eth0").set("ipv4", "method", "auto");

        let path = profile_path(&config, "eth0");
        write_profile(&config, &path, &props).unwrap();

        let md = fs::metadata(&path).unwrap();
        assert_eq!(md.permissions().mode() & 0o777, 0o600);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[connection]\nid=eth0\n\n[ipv4]\nmethod=auto\n"
        );
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_write_overwrites_and_tightens_existing_file() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);
        let path = profile_path(&config, "eth0");
        fs::write(&path, "[connection]\nid=eth0\nstale=a-much-longer-line-than-the-new-content\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let mut props = ConnectionProperties::new();
        props.set("connection", "id", "eth0");
        write_profile(&config, &path, &props).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[connection]\nid=eth0\n");
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_write_creates_connections_dir() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir).with_connections_dir(dir.path().join("nested/system-connections"));
        let mut props = ConnectionProperties::new();
        props.set("connection", "id", "br0");

        let path = profile_path(&config, "br0");
        write_profile(&config, &path, &props).unwrap();
        assert!(path.exists());
    }
}
