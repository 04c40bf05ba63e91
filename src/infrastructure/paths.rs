//! Path helpers for the data directory.
//!
//! The data directory holds `store.json` (the position cache) and the rotating
//! OTLP trace file. It defaults to `$HOME/.local/share/gym-discovery` and can
//! be overridden through [`Config::data_dir`](crate::Config::data_dir).

use std::path::PathBuf;

const APP_DIR: &str = "gym-discovery";

/// Returns the data directory for gym-discovery storage.
///
/// A configured directory wins (with `~` expanded). Without one, the XDG-style
/// location under `$HOME` is used. When `HOME` is unset the directory falls back
/// to `.gym-discovery` relative to the working directory.
///
/// # Examples
///
/// ```
/// use gym_discovery::infrastructure::get_data_dir;
///
/// let dir = get_data_dir(Some("/var/lib/gyms"));
/// assert_eq!(dir.to_str(), Some("/var/lib/gyms"));
/// ```
#[must_use]
pub fn get_data_dir(configured: Option<&str>) -> PathBuf {
    if let Some(dir) = configured.map(str::trim).filter(|d| !d.is_empty()) {
        return PathBuf::from(expand_tilde(dir));
    }

    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(format!(".{APP_DIR}")),
        |home| {
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join(APP_DIR)
        },
    )
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading tilde, and tilde paths when `HOME` is unset, are
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use gym_discovery::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/absolute/path"), "/absolute/path");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    let Some(home) = std::env::var_os("HOME") else {
        return path.to_string();
    };
    let home = home.to_string_lossy();

    if path == "~" {
        home.into_owned()
    } else if let Some(rest) = path.strip_prefix("~/") {
        format!("{}/{rest}", home.trim_end_matches('/'))
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_dir_wins() {
        assert_eq!(get_data_dir(Some("/srv/gyms")), PathBuf::from("/srv/gyms"));
    }

    #[test]
    fn blank_configured_dir_is_ignored() {
        let dir = get_data_dir(Some("   "));
        assert!(dir.ends_with(APP_DIR) || dir.ends_with(format!(".{APP_DIR}")));
    }

    #[test]
    fn tilde_expands_against_home() {
        let Some(home) = std::env::var_os("HOME") else {
            return;
        };
        let home = home.to_string_lossy().trim_end_matches('/').to_string();

        assert_eq!(expand_tilde("~/gyms"), format!("{home}/gyms"));
        assert_eq!(expand_tilde("relative/~"), "relative/~");
    }
}
