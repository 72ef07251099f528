//! Tipos de evento de una corrida y estructura `RunEvent`.
//!
//! Rol en la corrida:
//! - Cada ejecución del `RecipeEngine` emite eventos a un `EventStore`
//!   append-only.
//! - El journal permite auditar qué steps se ejecutaron, cuáles salieron de la
//!   cache y cuáles se heredaron por pickup, sin inspeccionar el árbol de
//!   salida.
//! - El enum `RunEventKind` define el contrato observable del motor.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::RecipeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de un `run_id`: orden resuelto de ejecución.
    RunInitialized {
        order: Vec<String>,
        pickup: bool,
        engine_version: String,
    },
    /// Un step comenzó su ejecución. No implica éxito.
    StepStarted { step_index: usize, step: String },
    /// Un sidecar previo satisfizo el step.
    CacheHit { step: String, fingerprint: String, verified: bool },
    /// No había cache utilizable; `reason` es informativo.
    CacheMiss { step: String, reason: String },
    /// Artifact reconstruido desde el linaje de otro artifact cacheado.
    StepInherited { step: String, fingerprint: String },
    StepFinished {
        step_index: usize,
        step: String,
        checksum: Option<String>,
        fingerprint: String,
    },
    /// Error terminal: la corrida no continúa (stop-on-failure).
    StepFailed { step_index: usize, step: String, error: RecipeError },
    /// Sidecar persistido para un artifact retenido.
    MetadataWritten { step: String, path: String },
    /// Cierre con fingerprint agregado (hash de fingerprints de productos en
    /// orden de ejecución).
    RunCompleted { run_fingerprint: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>, // metadato (no entra en fingerprint)
}
