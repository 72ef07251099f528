//! Receta: contenedor de steps declarados + política de la corrida.
//!
//! Los steps se registran explícitamente en un `RecipeBuilder`; no hay un
//! contexto global "activo". Los ingredientes se guardan como nombres y los
//! resuelve el `resolver` al ejecutar.
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::CacheMode;
use crate::errors::{RecipeError, Result};
use crate::hashing::ChecksumAlgorithm;
use crate::model::{posix, Role};
use crate::step::Step;

/// Política a nivel de corrida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePolicy {
    /// Carpeta de proyecto donde se escriben `data/` y `metadata/`.
    pub destination: PathBuf,
    /// Roles retenidos por defecto (cuando el step no fija `keep`).
    pub keep: Vec<Role>,
    /// Modo de cache para steps sin `trust_cache` explícito.
    pub cache_mode: CacheMode,
    pub pickup: bool,
    pub checksum: ChecksumAlgorithm,
    /// Borrar archivos de `data/` y `metadata/` que la receta no produce.
    pub prune: bool,
}

impl Default for RecipePolicy {
    fn default() -> Self {
        Self { destination: PathBuf::from("."),
               keep: vec![Role::Product],
               cache_mode: CacheMode::default(),
               pickup: false,
               checksum: ChecksumAlgorithm::default(),
               prune: true }
    }
}

#[derive(Debug, Clone)]
pub struct Recipe {
    name: String,
    steps: Vec<Step>,
    policy: RecipePolicy,
}

impl Recipe {
    pub fn builder(name: impl Into<String>) -> RecipeBuilder {
        RecipeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name() == name)
    }

    pub fn policy(&self) -> &RecipePolicy {
        &self.policy
    }

    pub fn destination(&self) -> &Path {
        &self.policy.destination
    }

    /// Copia de la receta apuntando a otro destino.
    pub fn with_destination(&self, destination: impl Into<PathBuf>) -> Recipe {
        let mut copy = self.clone();
        copy.policy.destination = destination.into();
        copy
    }

    /// Retención efectiva: `keep` explícito, rol producto, o rol incluido en
    /// la política. Los `mock-source` nunca se retienen.
    pub fn is_retained(&self, step: &Step, role: Role) -> bool {
        if role == Role::MockSource {
            return false;
        }
        match step.keep_flag() {
            Some(true) => true,
            _ if role == Role::Product => true,
            Some(false) => false,
            None => self.policy.keep.contains(&role),
        }
    }

    pub fn cache_mode_for(&self, step: &Step) -> CacheMode {
        step.cache_mode_override().unwrap_or(self.policy.cache_mode)
    }
}

/// Builder explícito de recetas.
#[derive(Debug)]
pub struct RecipeBuilder {
    name: String,
    steps: Vec<Step>,
    policy: RecipePolicy,
}

impl RecipeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               steps: Vec::new(),
               policy: RecipePolicy::default() }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn policy(mut self, policy: RecipePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.policy.destination = destination.into();
        self
    }

    pub fn keep(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.policy.keep = roles.into_iter().collect();
        self
    }

    pub fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.policy.cache_mode = mode;
        self
    }

    /// Equivalente a nivel receta de `Step::trust_cache`.
    pub fn trust_cache(self, trust: bool) -> Self {
        self.cache_mode(if trust { CacheMode::Trust } else { CacheMode::Refresh })
    }

    pub fn pickup(mut self, pickup: bool) -> Self {
        self.policy.pickup = pickup;
        self
    }

    pub fn checksum(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.policy.checksum = algorithm;
        self
    }

    pub fn prune(mut self, prune: bool) -> Self {
        self.policy.prune = prune;
        self
    }

    /// Valida nombres únicos y rutas de salida. Dos steps no pueden
    /// declarar la misma ruta fija (comparada en forma normalizada).
    pub fn build(self) -> Result<Recipe> {
        let mut seen = HashSet::new();
        let mut outputs: HashMap<String, &str> = HashMap::new();
        for step in &self.steps {
            if !seen.insert(step.name()) {
                return Err(RecipeError::DuplicateStep(step.name().to_string()));
            }
            step.validate_output()?;
            if let Some(rel) = step.output_spec().fixed() {
                let path = posix(rel);
                if let Some(first) = outputs.insert(path.clone(), step.name()) {
                    return Err(RecipeError::DuplicateOutput { path,
                                                              steps: vec![first.to_string(), step.name().to_string()] });
                }
            }
        }
        Ok(Recipe { name: self.name,
                    steps: self.steps,
                    policy: self.policy })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::model::ExecutionContext;
    use crate::step::{Instructions, StepRunResult};

    #[derive(Debug)]
    struct Noop;

    impl Instructions for Noop {
        fn run(&self, _ctx: &ExecutionContext) -> StepRunResult {
            StepRunResult::Success
        }
        fn definition(&self) -> Value {
            json!("noop")
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Recipe::builder("r").step(Step::new("a", Noop))
                                      .step(Step::new("a", Noop))
                                      .build()
                                      .unwrap_err();
        assert_eq!(err, RecipeError::DuplicateStep("a".into()));
    }

    #[test]
    fn shared_output_paths_are_rejected() {
        let err = Recipe::builder("r").step(Step::new("a", Noop).output("out/x.csv"))
                                      .step(Step::new("b", Noop))
                                      .step(Step::new("c", Noop).output("./out/x.csv"))
                                      .build()
                                      .unwrap_err();
        assert_eq!(err,
                   RecipeError::DuplicateOutput { path: "out/x.csv".into(),
                                                  steps: vec!["a".into(), "c".into()] });
    }

    #[test]
    fn retention_rules() {
        let recipe = Recipe::builder("r").keep([Role::Source]).build().unwrap();
        let plain = Step::new("s", Noop);
        assert!(recipe.is_retained(&plain, Role::Product));
        assert!(recipe.is_retained(&plain, Role::Source));
        assert!(!recipe.is_retained(&plain, Role::Intermediary));
        assert!(recipe.is_retained(&plain.clone().keep(true), Role::Intermediary));
        assert!(!recipe.is_retained(&plain.clone().keep(false), Role::Source));
        assert!(recipe.is_retained(&plain.clone().keep(false), Role::Product));
        assert!(!recipe.is_retained(&plain.keep(true), Role::MockSource));
    }

    #[test]
    fn step_cache_mode_overrides_policy() {
        let recipe = Recipe::builder("r").trust_cache(true).build().unwrap();
        assert_eq!(recipe.cache_mode_for(&Step::new("s", Noop)), CacheMode::Trust);
        assert_eq!(recipe.cache_mode_for(&Step::new("s", Noop).trust_cache(false)), CacheMode::Refresh);
    }

    #[test]
    fn with_destination_keeps_everything_else() {
        let recipe = Recipe::builder("r").step(Step::new("a", Noop)).pickup(true).build().unwrap();
        let moved = recipe.with_destination("/elsewhere");
        assert_eq!(moved.destination(), Path::new("/elsewhere"));
        assert!(moved.policy().pickup);
        assert_eq!(moved.steps().len(), 1);
    }
}
