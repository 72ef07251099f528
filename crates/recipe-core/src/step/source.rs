//! Colaboradores de tipo "fuente": productores de bytes externos.
//!
//! El núcleo no sabe descargar ni descomprimir nada; sólo exige que un
//! productor escriba los bytes en la ruta que se le entrega y que describa su
//! origen con metadata suficiente para embeberla en el linaje.
use std::fmt::Debug;
use std::path::Path;

use serde_json::{json, Value};

use super::definition::Instructions;
use super::run_result::{BoxError, StepRunResult};
use crate::model::ExecutionContext;

pub trait SourceProducer: Debug {
    /// Escribe los bytes crudos en `dest`.
    fn produce(&self, dest: &Path) -> Result<(), BoxError>;

    /// Descripción legible de la fuente.
    fn description(&self) -> String;

    /// Descriptor (p.ej. `{"url": ...}`) embebido tal cual en el linaje.
    fn descriptor(&self) -> Value;

    /// Contenido que identifica la lógica del productor. Por defecto, el
    /// propio descriptor.
    fn definition(&self) -> Value {
        self.descriptor()
    }
}

/// Adaptador que expone un `SourceProducer` como `Instructions`.
#[derive(Debug)]
pub struct Source<P> {
    producer: P,
}

impl<P: SourceProducer> Source<P> {
    pub fn new(producer: P) -> Self {
        Self { producer }
    }

    pub fn producer(&self) -> &P {
        &self.producer
    }
}

impl<P: SourceProducer> Instructions for Source<P> {
    fn run(&self, ctx: &ExecutionContext) -> StepRunResult {
        self.producer.produce(ctx.output()).into()
    }

    fn definition(&self) -> Value {
        json!({ "source": self.producer.definition() })
    }

    fn description(&self) -> Option<String> {
        Some(self.producer.description())
    }

    fn origin(&self) -> Option<Value> {
        Some(self.producer.descriptor())
    }
}

/// Instrucciones de un `mock-source`. El motor nunca las ejecuta; si algo
/// las invoca, fallan.
#[derive(Debug, Clone)]
pub struct MockSource {
    description: String,
    origin: Value,
}

impl MockSource {
    pub fn new(description: impl Into<String>, origin: Value) -> Self {
        Self { description: description.into(),
               origin }
    }
}

impl Instructions for MockSource {
    fn run(&self, ctx: &ExecutionContext) -> StepRunResult {
        StepRunResult::failure(format!("mock source '{}' cannot be executed", ctx.step))
    }

    fn definition(&self) -> Value {
        json!({ "mock_source": self.origin })
    }

    fn description(&self) -> Option<String> {
        Some(self.description.clone())
    }

    fn origin(&self) -> Option<Value> {
        Some(self.origin.clone())
    }
}
