//! recipe-core: motor de recetas de datos con linaje verificable.
//!
//! Resuelve el grafo de ingredientes, decide qué steps se saltan por cache,
//! ejecuta el resto y persiste un registro de linaje por artifact retenido.
pub mod cache;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod lineage;
pub mod model;
pub mod recipe;
pub mod registry;
pub mod resolver;
pub mod step;

pub use cache::CacheMode;
pub use engine::{verify_reproducible, RecipeEngine, RunSummary};
pub use errors::RecipeError;
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use hashing::ChecksumAlgorithm;
pub use lineage::{compare_packages, LineageRecord, PackageDiff};
pub use model::{Artifact, Checksum, ExecutionContext, Role};
pub use recipe::{Recipe, RecipeBuilder, RecipePolicy};
pub use step::{BoxError, Instructions, OutputSpec, SourceProducer, Step, StepRunResult, StepStatus};

#[doc(hidden)]
pub use serde_json as __serde_json;
