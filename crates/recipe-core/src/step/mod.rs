//! Definiciones relacionadas a Steps.
//!
//! Un Step es una unidad nombrada de transformación que produce un único
//! archivo a partir de cero o más artifacts ingrediente. Este módulo define:
//! - `Instructions`: capacidad que el motor invoca como caja negra.
//! - `Step`: declaración (ingredientes, salida, retención, modo de cache).
//! - `SourceProducer` / `Source`: frontera con los productores de bytes.
//! - `StepRunResult` y `StepStatus`.

pub mod definition;
pub mod macros;
mod run_result;
pub mod source;
mod status;

pub use definition::{Instructions, OutputSpec, Step};
pub use run_result::{BoxError, StepRunResult};
pub use source::{MockSource, Source, SourceProducer};
pub use status::StepStatus;
