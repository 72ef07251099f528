//! Constantes del motor core.
//!
//! Este módulo agrupa valores estáticos que participan en el layout del árbol
//! de salida y en la compatibilidad de los sidecars entre versiones del motor.

/// Versión lógica del motor. Se registra en el evento `RunInitialized`; no
/// participa de ningún fingerprint.
pub const ENGINE_VERSION: &str = "R1.0";

/// Subcarpeta del destino que contiene los datos retenidos.
pub const DATA_DIR: &str = "data";

/// Subcarpeta del destino que replica `DATA_DIR` con un sidecar por archivo.
pub const METADATA_DIR: &str = "metadata";

/// Sufijo que se agrega (no reemplaza) a la extensión del archivo de datos
/// para formar el nombre del sidecar: `x.csv` -> `x.csv.json`.
pub const SIDECAR_SUFFIX: &str = "json";

/// Nombre del archivo que produce un step con salida temporal.
pub const TEMPORARY_OUTPUT_NAME: &str = "output";
