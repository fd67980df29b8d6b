//! Where drillview keeps `config.toml`, and `~` expansion for log paths.
//!
//! `$XDG_CONFIG_HOME/drillview/` wins on every platform. Otherwise Linux uses
//! `~/.config/drillview/` and macOS `~/Library/Application Support/drillview/`.

use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "drillview";
const CONFIG_FILE: &str = "config.toml";

pub fn config_dir() -> PathBuf {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => platform_base(),
    };
    base.join(APP_DIR)
}

pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

#[cfg(target_os = "macos")]
fn platform_base() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| home().join("Library/Application Support"))
}

#[cfg(not(target_os = "macos"))]
fn platform_base() -> PathBuf {
    home().join(".config")
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// `~` and `~/…` resolve against the home directory; other paths pass through.
pub fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some("") => home(),
        Some(rest) if rest.starts_with('/') => home().join(&rest[1..]),
        _ => PathBuf::from(path),
    }
}

/// `create_dir_all`, then restrict the leaf to the owner (0700 on Unix).
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn with_xdg(value: Option<&str>, f: impl FnOnce()) {
        let original = std::env::var_os("XDG_CONFIG_HOME");
        match value {
            Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
        f();
        match original {
            Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    #[serial]
    fn xdg_config_home_wins() {
        with_xdg(Some("/srv/rig"), || {
            assert_eq!(config_path(), PathBuf::from("/srv/rig/drillview/config.toml"));
        });
    }

    #[test]
    #[serial]
    fn empty_or_unset_xdg_falls_back_to_platform() {
        let expected = platform_base().join("drillview").join("config.toml");
        with_xdg(None, || assert_eq!(config_path(), expected));
        with_xdg(Some(""), || assert_eq!(config_path(), expected));
    }

    #[test]
    fn tilde_expansion() {
        let home = dirs::home_dir().expect("home directory");
        assert_eq!(expand_tilde("~/logs/viewer.log"), home.join("logs/viewer.log"));
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde("~other/x"), PathBuf::from("~other/x"));
        assert_eq!(expand_tilde("/var/log/drillview.log"), PathBuf::from("/var/log/drillview.log"));
        assert_eq!(expand_tilde("logs/v.log"), PathBuf::from("logs/v.log"));
    }

    #[cfg(unix)]
    #[test]
    fn ensure_dir_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().expect("temp dir");
        let dir = tmp.path().join("a/b/drillview");
        ensure_dir(&dir).expect("ensure_dir");
        let mode = fs::metadata(&dir).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
