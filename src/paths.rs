//! Path resolution for crateward
//!
//! # Environment Variables
//!
//! - `CRATEWARD_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/crateward`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `CRATEWARD_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/crateward` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\crateward`
//!    - macOS/Linux: `~/.config/crateward`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "CRATEWARD_CONFIG_DIR";

/// Name of the default declaration file inside the config directory
pub const DECLARATIONS_FILE: &str = "crates.toml";

/// Get the crateward config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("crateward");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join("crateward");
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("crateward");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Default location of the declaration file
pub fn declarations_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(DECLARATIONS_FILE))
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables leave the string unchanged.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Run `f` with `key` set (or removed), restoring the old value after.
    ///
    /// # Safety
    /// Uses unsafe env::set_var/remove_var; each variable is only touched by
    /// a single test.
    fn with_env<F, R>(key: &str, value: Option<&str>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: no other test reads or writes this variable
        unsafe {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
        let result = f();
        // SAFETY: as above
        unsafe {
            match original {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
        result
    }

    #[test]
    fn test_config_dir_resolution() {
        with_env(ENV_CONFIG_DIR, Some("/custom/config/path"), || {
            assert_eq!(config_dir().unwrap(), PathBuf::from("/custom/config/path"));
            assert_eq!(
                declarations_file().unwrap(),
                PathBuf::from("/custom/config/path/crates.toml")
            );
        });

        let home = dirs::home_dir().unwrap();
        with_env(ENV_CONFIG_DIR, Some("~/dotfiles/crateward"), || {
            assert_eq!(config_dir().unwrap(), home.join("dotfiles").join("crateward"));
        });

        with_env(ENV_CONFIG_DIR, None, || {
            with_env("XDG_CONFIG_HOME", Some("/tmp/xdg-config-test"), || {
                assert_eq!(
                    config_dir().unwrap(),
                    PathBuf::from("/tmp/xdg-config-test/crateward")
                );
            });
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_with_env_var() {
        with_env("CRATEWARD_TEST_VAR", Some("test_value"), || {
            let result = expand("/path/$CRATEWARD_TEST_VAR/file");
            assert_eq!(result, PathBuf::from("/path/test_value/file"));
        });
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}
