use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Contexto de ejecución entregado a `Instructions::run`.
///
/// Las instrucciones sólo deben leer de las rutas de ingredientes ligadas y
/// escribir exactamente el archivo `output`. `workspace` es un directorio
/// propio del step para archivos auxiliares; el motor no cambia el directorio
/// de trabajo del proceso.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub step: String,
    pub ingredients: IndexMap<String, PathBuf>,
    pub output: PathBuf,
    pub workspace: PathBuf,
}

impl ExecutionContext {
    /// Ruta del artifact ligado a `binding`.
    pub fn ingredient(&self, binding: &str) -> io::Result<&Path> {
        match self.ingredients.get(binding) {
            Some(p) => Ok(p.as_path()),
            None => Err(io::Error::new(io::ErrorKind::NotFound,
                                       format!("step '{}' has no ingredient bound as '{binding}'", self.step))),
        }
    }

    /// Ruta que las instrucciones deben crear.
    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Resuelve una ruta relativa contra el workspace del step.
    pub fn scratch(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.workspace.join(relative)
    }
}
