//! JSON report files

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};

/// Default file for the snapshot command
pub const DEFAULT_SPECS_PATH: &str = "specs.json";

/// Write `value` as pretty-printed JSON, replacing any existing file and
/// creating a missing parent directory
pub fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
    }

    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json).map_err(|e| Error::write(path, e))?;

    info!(path = %path.display(), "Report written");
    Ok(())
}

/// Parse a JSON report back into its record type
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    Ok(serde_json::from_str(&content)?)
}
