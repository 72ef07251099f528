//! Registro en memoria de los artifacts de una corrida.
//!
//! Un artifact se registra una sola vez (al terminar su step, al salir de la
//! cache o al heredarse por pickup) y no se modifica después.
use indexmap::IndexMap;

use crate::errors::{RecipeError, Result};
use crate::model::Artifact;

#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    artifacts: IndexMap<String, Artifact>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, artifact: Artifact) -> Result<()> {
        if self.artifacts.contains_key(&artifact.name) {
            return Err(RecipeError::Internal(format!("artifact '{}' registered twice", artifact.name)));
        }
        self.artifacts.insert(artifact.name.clone(), artifact);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&Artifact> {
        self.get(name)
            .ok_or_else(|| RecipeError::Internal(format!("artifact '{name}' requested before registration")))
    }

    /// Fingerprints de `names`, en el mismo orden.
    pub fn fingerprints<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<Vec<String>> {
        names.into_iter().map(|n| self.require(n).map(|a| a.fingerprint.clone())).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
