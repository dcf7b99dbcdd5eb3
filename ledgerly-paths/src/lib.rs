//! XDG Base Directory paths for ledgerly.
//!
//! The stored credential lives under XDG paths on every platform, not the
//! platform-native locations.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "ledgerly";

/// Get the ledgerly data directory.
///
/// Returns `$XDG_DATA_HOME/ledgerly` if set, otherwise `~/.local/share/ledgerly`.
/// The stored session credential lives here.
///
/// # Examples
///
/// ```
/// use ledgerly_paths::data_dir;
///
/// let data = data_dir();
/// let credential = data.join("credential.json");
/// ```
pub fn data_dir() -> PathBuf {
    resolve(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        dirs::home_dir(),
        ".local/share",
    )
}

fn resolve(xdg: Option<PathBuf>, home: Option<PathBuf>, fallback: &str) -> PathBuf {
    match (xdg, home) {
        (Some(xdg), _) if !xdg.as_os_str().is_empty() => xdg.join(APP_DIR),
        (_, Some(home)) => home.join(fallback).join(APP_DIR),
        _ => Path::new(fallback).join(APP_DIR),
    }
}
