//! Motor de ejecución: run loop, Step Executor y árbol de salida.

mod core;
mod executor;
mod verify;
pub mod workspace;

pub use self::core::{RecipeEngine, RunSummary};
pub use verify::verify_reproducible;
pub use workspace::OutputTree;
