use serde::{Deserialize, Serialize};

/// Estado de un Step en tiempo de ejecución.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Running` -> `FinishedOk` | `Failed`
/// - `Pending` -> `Cached` (sidecar válido de una corrida previa)
/// - `Pending` -> `Inherited` (pickup: reconstruido desde linaje cacheado)
/// - `Pending` -> `Declared` (mock-source)
///
/// No se permiten reversiones o saltos arbitrarios entre estados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// El paso está pendiente de ejecución.
    Pending,
    /// El paso está en ejecución.
    Running,
    /// El paso finalizó correctamente.
    FinishedOk,
    /// El paso se satisfizo desde la cache sin ejecutar instrucciones.
    Cached,
    /// El paso no se ejecutó; su artifact proviene del linaje de otro.
    Inherited,
    /// Placeholder `mock-source`.
    Declared,
    /// El paso falló.
    Failed,
}

impl StepStatus {
    /// `true` si el artifact del paso quedó registrado.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::FinishedOk | Self::Cached | Self::Inherited | Self::Declared)
    }
}
