//! Errores del motor de recetas.
//!
//! Todos los errores son fatales para la corrida: se propagan al caller de
//! `RecipeEngine::run` sin reintentos. Las cargas útiles son `String` para que
//! el error pueda serializarse dentro de un `RunEvent::StepFailed`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum RecipeError {
    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },
    #[error("step '{step}' references ingredient '{ingredient}', which is not a step of this recipe")]
    UnknownIngredient { step: String, ingredient: String },
    #[error("step '{step}' failed: {reason}")]
    StepExecutionFailed { step: String, reason: String },
    #[error("step '{step}' did not produce its declared output {path}")]
    MissingOutput { step: String, path: String },
    #[error("cached artifact for step '{step}' is corrupt ({path}): expected {expected}, found {found}")]
    CacheCorruption {
        step: String,
        path: String,
        expected: String,
        found: String,
    },
    #[error("duplicate step name '{0}'")]
    DuplicateStep(String),
    #[error("output path '{path}' is declared by more than one step: {}", steps.join(", "))]
    DuplicateOutput { path: String, steps: Vec<String> },
    #[error("step '{step}' is retained but declares no output path")]
    UndefinedOutput { step: String },
    #[error("step '{step}' declares an invalid output path '{path}' (must be relative, without '..')")]
    InvalidOutputPath { step: String, path: String },
    #[error("io error at {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("metadata error at {path}: {reason}")]
    Metadata { path: String, reason: String },
    #[error("internal: {0}")]
    Internal(String),
}

impl RecipeError {
    /// Helper para mapear `std::io::Error` conservando la ruta involucrada.
    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io { path: path.display().to_string(),
                   reason: err.to_string() }
    }

    /// Helper para errores de (de)serialización de sidecars.
    pub fn metadata(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Metadata { path: path.display().to_string(),
                         reason: err.to_string() }
    }
}

pub type Result<T, E = RecipeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_names_every_step() {
        let err = RecipeError::CyclicDependency { cycle: vec!["a".into(), "b".into(), "a".into()] };
        assert_eq!(err.to_string(), "cyclic dependency: a -> b -> a");
    }

    #[test]
    fn unknown_ingredient_names_both_sides() {
        let err = RecipeError::UnknownIngredient { step: "clean".into(),
                                                   ingredient: "nonexistent".into() };
        let msg = err.to_string();
        assert!(msg.contains("'clean'") && msg.contains("'nonexistent'"), "{msg}");
    }

    #[test]
    fn errors_roundtrip_through_json() {
        let err = RecipeError::MissingOutput { step: "s".into(),
                                               path: "out.txt".into() };
        let json = serde_json::to_string(&err).unwrap();
        let back: RecipeError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
