//! Fuente: archivo del sistema de archivos local.
//!
//! El archivo se copia al workspace del step; el original nunca se mueve ni
//! se modifica.
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use recipe_core::step::BoxError;
use recipe_core::SourceProducer;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceProducer for LocalFile {
    fn produce(&self, dest: &Path) -> Result<(), BoxError> {
        debug!("copying local source {} -> {}", self.path.display(), dest.display());
        fs::copy(&self.path, dest).map_err(|e| format!("cannot read {}: {e}", self.path.display()))?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Source file from local file system: {}", self.path.display())
    }

    fn descriptor(&self) -> Value {
        json!({ "kind": "local", "path": self.path.display().to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_bytes_and_describes_origin() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("input.csv");
        fs::write(&src, "a,b\n1,2\n").unwrap();

        let producer = LocalFile::new(&src);
        let dest = dir.path().join("copy.csv");
        producer.produce(&dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "a,b\n1,2\n");
        assert!(src.exists());
        assert_eq!(producer.descriptor()["kind"], "local");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let producer = LocalFile::new(dir.path().join("nope.csv"));
        let err = producer.produce(&dir.path().join("out")).unwrap_err();
        assert!(err.to_string().contains("nope.csv"));
    }
}
