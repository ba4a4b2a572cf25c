//! Filesystem layout for relayforge.
//!
//! Resolves the data directory, the database location inside it, and writes
//! downloaded artifacts to disk for the CLI.

use std::path::{Path, PathBuf};

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `RELAYFORGE_DATA_DIR` environment variable
/// 2. `~/.relayforge` under the user's home directory
/// 3. `.relayforge` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RELAYFORGE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".relayforge");
    }

    PathBuf::from(".relayforge")
}

/// Path of the SQLite database file: `{data_dir}/relayforge.db`.
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("relayforge.db")
}

/// sqlx connection URL for the database in `data_dir`.
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", database_path(data_dir).display())
}

/// Write an artifact into `dir`, creating the directory if needed.
///
/// `file_name` must be a bare file name; anything carrying a path component
/// is rejected.
pub async fn write_artifact(
    dir: &Path,
    file_name: &str,
    payload: &[u8],
) -> Result<PathBuf, std::io::Error> {
    let is_bare = Path::new(file_name)
        .file_name()
        .is_some_and(|name| name == file_name);
    if !is_bare {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("artifact file name '{file_name}' is not a bare file name"),
        ));
    }

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, payload).await?;
    Ok(path)
}
