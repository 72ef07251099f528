//! recipeflow
//!
//! Fachada del workspace:
//! - Re-exporta el motor (`recipe-core`) y los adaptadores prefabricados.
//! - Expone `config` para leer la política de corrida desde el entorno.
//! - Expone `errors` con los errores propios de esta capa.

pub mod config;
pub mod errors;

pub use config::RecipeConfig;
pub use errors::ConfigError;
pub use recipe_adapters::{Concatenate, CopyIngredient, InlineBytes, LocalFile, Uppercase};
pub use recipe_core::{compare_packages, recipe_step, verify_reproducible, CacheMode, ChecksumAlgorithm,
                      ExecutionContext, Instructions, OutputSpec, Recipe, RecipeBuilder, RecipeEngine, RecipeError,
                      RecipePolicy, Role, RunEvent, RunEventKind, RunSummary, SourceProducer, Step, StepRunResult,
                      StepStatus};
