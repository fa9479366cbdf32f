#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::adapters::storage::LocalStorage;
use crate::adapters::store::JsonContactStore;
use std::path::Path;

/// Splits a contacts file path into a storage root and the file name inside it.
pub fn contact_store(path: &str) -> JsonContactStore<LocalStorage> {
    let path = Path::new(path);
    let base = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "birthdays.json".to_string());

    JsonContactStore::new(LocalStorage::new(base), file_name)
}
