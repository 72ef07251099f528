//! Lineage Assembler: registros de procedencia por artifact retenido,
//! lectura/escritura de sidecars y comparación de paquetes.

pub mod assembler;
pub mod compare;
pub mod record;
pub mod sidecar;

pub use assembler::{assemble, LineageAssembler};
pub use compare::{compare_packages, PackageDiff};
pub use record::LineageRecord;
pub use sidecar::{read_sidecar, sidecar_path, write_sidecar};
