//! Árbol de salida de una corrida.
//!
//! ```text
//! <destination>/
//!   data/<rel>             artifacts retenidos
//!   metadata/<rel>.json    sidecar de linaje por artifact retenido
//!   .recipe-XXXX/<uuid>/   workspace temporal (se borra al terminar)
//! ```
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::TempDir;
use uuid::Uuid;

use crate::constants::{DATA_DIR, METADATA_DIR};
use crate::errors::{RecipeError, Result};
use crate::lineage::sidecar_path;

#[derive(Debug)]
pub struct OutputTree {
    destination: PathBuf,
    data_root: PathBuf,
    metadata_root: PathBuf,
    workspace: TempDir,
}

impl OutputTree {
    pub fn open(destination: &Path) -> Result<Self> {
        let data_root = destination.join(DATA_DIR);
        let metadata_root = destination.join(METADATA_DIR);
        for dir in [&data_root, &metadata_root] {
            fs::create_dir_all(dir).map_err(|e| RecipeError::io(dir, e))?;
        }
        // Mismo sistema de archivos que `data/` para que retener sea un rename.
        let workspace = tempfile::Builder::new().prefix(".recipe-")
                                                .tempdir_in(destination)
                                                .map_err(|e| RecipeError::io(destination, e))?;
        Ok(Self { destination: destination.to_path_buf(),
                  data_root,
                  metadata_root,
                  workspace })
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn metadata_root(&self) -> &Path {
        &self.metadata_root
    }

    pub fn data_path(&self, relative: &Path) -> PathBuf {
        self.data_root.join(relative)
    }

    pub fn sidecar_path(&self, relative: &Path) -> PathBuf {
        sidecar_path(&self.metadata_root, relative)
    }

    /// Directorio nuevo y exclusivo para un step dentro del workspace.
    pub fn step_workspace(&self) -> Result<PathBuf> {
        let dir = self.workspace.path().join(Uuid::new_v4().simple().to_string());
        fs::create_dir_all(&dir).map_err(|e| RecipeError::io(&dir, e))?;
        Ok(dir)
    }

    /// Mueve `src` a `data/<relative>`, reemplazando una versión previa.
    pub fn retain(&self, src: &Path, relative: &Path) -> Result<PathBuf> {
        let dest = self.data_path(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| RecipeError::io(parent, e))?;
        }
        if dest.exists() {
            fs::remove_file(&dest).map_err(|e| RecipeError::io(&dest, e))?;
        }
        if let Err(e) = fs::rename(src, &dest) {
            debug!("rename {} failed ({e}); copying instead", src.display());
            fs::copy(src, &dest).map_err(|e| RecipeError::io(&dest, e))?;
            fs::remove_file(src).map_err(|e| RecipeError::io(src, e))?;
        }
        Ok(dest)
    }

    /// Borra de `data/` y `metadata/` todo archivo que no esté en `keep`
    /// (rutas relativas a `data/`). Devuelve las rutas eliminadas.
    pub fn prune(&self, keep: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let data: HashSet<PathBuf> = keep.iter().map(|r| self.data_path(r)).collect();
        let meta: HashSet<PathBuf> = keep.iter().map(|r| self.sidecar_path(r)).collect();
        let mut removed = Vec::new();
        for (root, expected) in [(&self.data_root, &data), (&self.metadata_root, &meta)] {
            for rel in list_files(root)? {
                let path = root.join(&rel);
                if !expected.contains(&path) {
                    warn!("removing unexpected file {}", path.display());
                    fs::remove_file(&path).map_err(|e| RecipeError::io(&path, e))?;
                    removed.push(path);
                }
            }
        }
        Ok(removed)
    }
}

/// Lista recursiva de archivos bajo `root`, relativos a `root` y ordenados.
/// Un `root` inexistente equivale a un árbol vacío.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(RecipeError::io(&dir, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| RecipeError::io(&dir, e))?;
            let path = entry.path();
            let kind = entry.file_type().map_err(|e| RecipeError::io(&path, e))?;
            if kind.is_dir() {
                stack.push(path);
            } else if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_path_buf());
            }
        }
    }
    out.sort();
    Ok(out)
}
