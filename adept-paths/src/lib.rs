//! XDG Base Directory paths for adept.
//!
//! The CLI keeps its config and interview data under XDG paths on every
//! platform, so a session saved on one machine is found in the same place
//! on another.

use std::path::PathBuf;

const APP_DIR: &str = "adept";

/// Get the adept config directory.
///
/// Returns `$XDG_CONFIG_HOME/adept` if set, otherwise `~/.config/adept`.
/// The user-level `config.toml` lives here.
///
/// # Examples
///
/// ```
/// use adept_paths::config_dir;
///
/// let config_file = config_dir().join("config.toml");
/// assert!(config_file.ends_with("adept/config.toml"));
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the adept data directory.
///
/// Returns `$XDG_DATA_HOME/adept` if set, otherwise `~/.local/share/adept`.
/// Saved sessions, evaluations and profiles are written below this directory.
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// Directory holding persisted interview sessions.
pub fn sessions_dir() -> PathBuf {
    data_dir().join("sessions")
}

fn xdg_dir(env_var: &str, home_relative: &str) -> PathBuf {
    if let Ok(base) = std::env::var(env_var)
        && !base.is_empty()
    {
        PathBuf::from(base).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(home_relative).join(APP_DIR)
    } else {
        PathBuf::from(home_relative).join(APP_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn config_dir_ends_with_adept() {
        assert!(config_dir().ends_with("adept"));
    }

    #[test]
    #[serial]
    fn sessions_dir_is_below_data_dir() {
        assert!(sessions_dir().starts_with(data_dir()));
        assert!(sessions_dir().ends_with("adept/sessions"));
    }

    #[test]
    #[serial]
    fn config_dir_respects_xdg_env() {
        // SAFETY: serialized with the other env-mutating tests
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-config");
        }
        let path = config_dir();
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
        assert_eq!(path, PathBuf::from("/tmp/test-config/adept"));
    }

    #[test]
    #[serial]
    fn data_dir_respects_xdg_env() {
        // SAFETY: serialized with the other env-mutating tests
        unsafe {
            std::env::set_var("XDG_DATA_HOME", "/tmp/test-data");
        }
        let path = data_dir();
        unsafe {
            std::env::remove_var("XDG_DATA_HOME");
        }
        assert_eq!(path, PathBuf::from("/tmp/test-data/adept"));
    }
}
