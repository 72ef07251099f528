//! Artifact del registro de una corrida.
//!
//! Un `Artifact` es un archivo de datos en un punto de su historia de
//! transformación. Es inmutable una vez registrado: el motor nunca lo edita
//! en sitio, sólo lo mueve al árbol de salida cuando se retiene.
//! - `checksum`: digest del contenido crudo (ausente en `mock-source`).
//! - `fingerprint`: digest transitivo (código + checksum + ancestros), base
//!   de la cache.
//! - `codified`: digest calculable antes de ejecutar (código + ruta +
//!   codified de ancestros), usado por el modo pickup.
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hashing::ChecksumAlgorithm;

/// Rol que juega un artifact dentro de la receta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Source,
    Intermediary,
    Product,
    /// Placeholder declarado pero nunca materializado por el motor.
    MockSource,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Intermediary => "intermediary",
            Role::Product => "product",
            Role::MockSource => "mock-source",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "source" => Ok(Role::Source),
            "intermediary" => Ok(Role::Intermediary),
            "product" => Ok(Role::Product),
            "mock-source" | "mock_source" => Ok(Role::MockSource),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Algoritmo + digest hex del contenido de un archivo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub value: String,
}

impl Checksum {
    pub fn new(algorithm: ChecksumAlgorithm, value: impl Into<String>) -> Self {
        Self { algorithm,
               value: value.into() }
    }
}

/// Cómo obtuvo la corrida actual el artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Las instrucciones del step se ejecutaron en esta corrida.
    Executed,
    /// Un sidecar de una corrida previa satisfizo el step.
    Cached,
    /// Reconstruido desde el linaje de otro artifact cacheado (pickup).
    Inherited,
    /// `mock-source`: sólo descriptor.
    Declared,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Nombre del step que lo produjo (único en la receta).
    pub name: String,
    /// Ubicación actual en disco (workspace temporal o árbol de datos).
    pub path: PathBuf,
    /// Ruta declarada, relativa a `data/`. `None` para salidas temporales.
    pub relative_path: Option<PathBuf>,
    pub role: Role,
    pub checksum: Option<Checksum>,
    pub code_fingerprint: String,
    pub codified: String,
    pub fingerprint: String,
    pub description: Option<String>,
    /// Descriptor de origen (p.ej. URL) embebido tal cual en el linaje.
    pub origin: Option<Value>,
    /// Nombres de los ancestros directos, en orden de declaración.
    pub lineage: Vec<String>,
    pub retained: bool,
    pub provenance: Provenance,
    /// Metadato incidental (no entra en ningún fingerprint).
    pub recorded_at: DateTime<Utc>,
}

impl Artifact {
    pub fn is_root(&self) -> bool {
        self.lineage.is_empty()
    }

    /// Ruta relativa como string POSIX, tal como se persiste.
    pub fn relative_path_str(&self) -> Option<String> {
        self.relative_path.as_ref().map(|p| posix(p))
    }
}

/// Renderiza una ruta relativa con separadores `/` independientemente de la
/// plataforma, para que los sidecars y fingerprints sean portables. Los
/// componentes `.` se descartan: `./x.txt` y `x.txt` son la misma ruta.
pub fn posix(path: &std::path::Path) -> String {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&Role::MockSource).unwrap(), "\"mock-source\"");
        assert_eq!("Product".parse::<Role>(), Ok(Role::Product));
        assert!("final".parse::<Role>().is_err());
    }

    #[test]
    fn posix_joins_components_with_slash() {
        let p: PathBuf = ["nested", "dir", "file.csv"].iter().collect();
        assert_eq!(posix(&p), "nested/dir/file.csv");
    }

    #[test]
    fn posix_drops_current_dir_components() {
        assert_eq!(posix(std::path::Path::new("./x.txt")), "x.txt");
        assert_eq!(posix(std::path::Path::new("a/./b.csv")), "a/b.csv");
    }
}
