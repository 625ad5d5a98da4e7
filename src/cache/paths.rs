// Cache path utilities.
// Resolves the config, data and log locations for ghsearch.

use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "ghsearch")
}

/// Get the base data directory (~/.local/share/ghsearch on Linux).
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Path to the config file.
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path to the persisted favorites.
pub fn favorites_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("favorites.json"))
}

/// Path to the log file.
pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("ghsearch.log"))
}
