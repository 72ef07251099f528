use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::LineageRecord;
use crate::constants::SIDECAR_SUFFIX;
use crate::errors::{RecipeError, Result};

/// Ruta del sidecar de `relative` bajo `metadata_root`: se agrega el sufijo
/// al nombre completo (`x.csv` -> `x.csv.json`).
pub fn sidecar_path(metadata_root: &Path, relative: &Path) -> PathBuf {
    let mut name = relative.as_os_str().to_os_string();
    name.push(".");
    name.push(SIDECAR_SUFFIX);
    metadata_root.join(PathBuf::from(name))
}

pub fn write_sidecar(path: &Path, record: &LineageRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| RecipeError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(record).map_err(|e| RecipeError::metadata(path, e))?;
    fs::write(path, json).map_err(|e| RecipeError::io(path, e))
}

/// Lee un sidecar. `Ok(None)` si no existe.
pub fn read_sidecar(path: &Path) -> Result<Option<LineageRecord>> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RecipeError::io(path, e)),
    };
    serde_json::from_str(&text).map(Some).map_err(|e| RecipeError::metadata(path, e))
}
