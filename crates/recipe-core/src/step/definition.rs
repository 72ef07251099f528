use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::run_result::StepRunResult;
use super::source::{MockSource, Source, SourceProducer};
use crate::cache::CacheMode;
use crate::errors::{RecipeError, Result};
use crate::model::{code_fingerprint, ExecutionContext, Role};

/// Capacidad que implementa la lógica de transformación de un step.
///
/// El motor trata `run` como una caja negra: recibe las rutas de los
/// ingredientes y debe escribir exactamente el archivo `ctx.output()`.
pub trait Instructions: fmt::Debug {
    /// Ejecuta la lógica. No debe leer más que los ingredientes ligados.
    fn run(&self, ctx: &ExecutionContext) -> StepRunResult;

    /// Contenido que define la lógica (representación textual/serializada).
    /// Cualquier cambio aquí invalida la cache del step y sus descendientes.
    fn definition(&self) -> Value;

    /// Descripción legible por defecto del step.
    fn description(&self) -> Option<String> {
        None
    }

    /// Descriptor de origen (fuentes). Se embebe tal cual en el linaje.
    fn origin(&self) -> Option<Value> {
        None
    }

    fn code_fingerprint(&self) -> String {
        code_fingerprint(&self.definition())
    }
}

/// Descriptor de salida declarado por un step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSpec {
    /// Ruta fija relativa al árbol `data/`.
    Fixed(PathBuf),
    /// Nombre asignado por el motor dentro del workspace de la corrida.
    Temporary,
}

impl OutputSpec {
    pub fn fixed(&self) -> Option<&Path> {
        match self {
            OutputSpec::Fixed(p) => Some(p.as_path()),
            OutputSpec::Temporary => None,
        }
    }
}

/// Declaración de un step: nombre, ingredientes, salida y lógica.
///
/// Los ingredientes se guardan como nombres planos (binding -> step) y sólo
/// se resuelven contra la receta en el `resolver`.
#[derive(Clone)]
pub struct Step {
    name: String,
    description: Option<String>,
    role: Option<Role>,
    output: OutputSpec,
    ingredients: IndexMap<String, String>,
    instructions: Arc<dyn Instructions>,
    keep: Option<bool>,
    cache_mode: Option<CacheMode>,
}

impl Step {
    pub fn new(name: impl Into<String>, instructions: impl Instructions + 'static) -> Self {
        Self { name: name.into(),
               description: None,
               role: None,
               output: OutputSpec::Temporary,
               ingredients: IndexMap::new(),
               instructions: Arc::new(instructions),
               keep: None,
               cache_mode: None }
    }

    /// Step raíz respaldado por un productor de fuente externo.
    pub fn source(name: impl Into<String>, producer: impl SourceProducer + 'static) -> Self {
        Self::new(name, Source::new(producer))
    }

    /// Placeholder `mock-source`: aparece en el linaje pero nunca se ejecuta.
    pub fn mock_source(name: impl Into<String>,
                       path: impl Into<PathBuf>,
                       description: impl Into<String>,
                       origin: Value)
                       -> Self {
        let description = description.into();
        Self::new(name, MockSource::new(description.clone(), origin)).role(Role::MockSource)
                                                                      .description(description)
                                                                      .output(path)
    }

    /// Liga el artifact del step `step` bajo el nombre local `binding`.
    pub fn ingredient(mut self, binding: impl Into<String>, step: impl Into<String>) -> Self {
        self.ingredients.insert(binding.into(), step.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = OutputSpec::Fixed(path.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = Some(keep);
        self
    }

    /// `true` confía en la cache sin recalcular checksum; `false` fuerza la
    /// re-ejecución aunque exista una coincidencia.
    pub fn trust_cache(mut self, trust: bool) -> Self {
        self.cache_mode = Some(if trust { CacheMode::Trust } else { CacheMode::Refresh });
        self
    }

    pub fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = Some(mode);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descripción explícita o, en su defecto, la de las instrucciones.
    pub fn step_description(&self) -> Option<String> {
        self.description.clone().or_else(|| self.instructions.description())
    }

    pub fn declared_role(&self) -> Option<Role> {
        self.role
    }

    pub fn output_spec(&self) -> &OutputSpec {
        &self.output
    }

    pub fn ingredients(&self) -> &IndexMap<String, String> {
        &self.ingredients
    }

    /// Nombres de los steps de los que depende, sin repetir, en orden de
    /// declaración. Es el orden del linaje.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::with_capacity(self.ingredients.len());
        for s in self.ingredients.values() {
            if !deps.contains(&s.as_str()) {
                deps.push(s.as_str());
            }
        }
        deps
    }

    pub fn instructions(&self) -> &dyn Instructions {
        self.instructions.as_ref()
    }

    pub fn keep_flag(&self) -> Option<bool> {
        self.keep
    }

    pub fn cache_mode_override(&self) -> Option<CacheMode> {
        self.cache_mode
    }

    pub fn is_mock(&self) -> bool {
        self.role == Some(Role::MockSource)
    }

    /// Valida que la salida fija sea relativa y no escape del árbol de datos.
    pub(crate) fn validate_output(&self) -> Result<()> {
        if let OutputSpec::Fixed(p) = &self.output {
            let ok = p.components().any(|c| matches!(c, Component::Normal(_)))
                     && p.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
            if !ok {
                return Err(RecipeError::InvalidOutputPath { step: self.name.clone(),
                                                            path: p.display().to_string() });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
         .field("name", &self.name)
         .field("role", &self.role)
         .field("output", &self.output)
         .field("ingredients", &self.ingredients)
         .field("instructions", &self.instructions)
         .field("keep", &self.keep)
         .field("cache_mode", &self.cache_mode)
         .finish()
    }
}
