//! Cache Layer: decide si un sidecar de una corrida previa satisface un step.
//!
//! La capa sólo lee el árbol de salida; nunca modifica archivos de datos ni
//! sidecars.
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::CacheMode;
use crate::errors::{RecipeError, Result};
use crate::hashing::ChecksumAlgorithm;
use crate::lineage::{read_sidecar, sidecar_path, LineageRecord};

/// Qué debe coincidir entre el step actual y el sidecar almacenado.
#[derive(Debug, Clone, Copy)]
pub enum CacheKey<'a> {
    /// Fingerprint de código + cadena de fingerprints de los ancestros.
    Chain { instructions: &'a str, lineage: &'a [String] },
    /// Fingerprint codified (modo pickup, antes de ejecutar ancestros).
    Codified(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit {
        record: LineageRecord,
        data_path: PathBuf,
        /// `true` si el checksum se recalculó sobre el archivo.
        verified: bool,
    },
    Miss { reason: String },
}

impl CacheLookup {
    fn miss(reason: impl Into<String>) -> Self {
        Self::Miss { reason: reason.into() }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CacheLayer {
    data_root: PathBuf,
    metadata_root: PathBuf,
    algorithm: ChecksumAlgorithm,
}

impl CacheLayer {
    pub fn new(data_root: impl Into<PathBuf>, metadata_root: impl Into<PathBuf>, algorithm: ChecksumAlgorithm) -> Self {
        Self { data_root: data_root.into(),
               metadata_root: metadata_root.into(),
               algorithm }
    }

    /// Busca un artifact reutilizable para `step` en `relative`.
    ///
    /// Devuelve `Err(CacheCorruption)` sólo en modo `Verify`, cuando el
    /// sidecar coincide pero el archivo no tiene el checksum almacenado.
    pub fn lookup(&self, step: &str, relative: &Path, mode: CacheMode, key: CacheKey<'_>) -> Result<CacheLookup> {
        if mode == CacheMode::Refresh {
            return Ok(CacheLookup::miss("refresh requested"));
        }
        let meta_path = sidecar_path(&self.metadata_root, relative);
        let record = match read_sidecar(&meta_path) {
            Ok(Some(r)) => r,
            Ok(None) => return Ok(CacheLookup::miss("no sidecar")),
            Err(e) => {
                warn!("step={step} ignoring unreadable sidecar: {e}");
                return Ok(CacheLookup::miss("unreadable sidecar"));
            }
        };

        let matches = match key {
            CacheKey::Chain { instructions, lineage } => {
                record.instructions == instructions && record.ancestor_fingerprints() == lineage
            }
            CacheKey::Codified(codified) => record.codified == codified,
        };
        if !matches {
            return Ok(CacheLookup::miss("fingerprint chain changed"));
        }
        let Some(stored) = record.checksum.clone() else {
            return Ok(CacheLookup::miss("sidecar has no checksum"));
        };
        if stored.algorithm != self.algorithm {
            debug!("step={step} cached checksum uses {} but run uses {}", stored.algorithm, self.algorithm);
            return Ok(CacheLookup::miss("checksum algorithm changed"));
        }
        if !record.is_consistent() {
            warn!("step={step} sidecar fingerprint does not match its own fields; ignoring");
            return Ok(CacheLookup::miss("inconsistent sidecar"));
        }

        let data_path = self.data_root.join(relative);
        if !data_path.is_file() {
            return Ok(CacheLookup::miss("data file missing"));
        }

        let verified = match mode {
            CacheMode::Trust => false,
            _ => {
                let found = self.algorithm.digest_file(&data_path).map_err(|e| RecipeError::io(&data_path, e))?;
                if found != stored.value {
                    return Err(RecipeError::CacheCorruption { step: step.to_string(),
                                                              path: data_path.display().to_string(),
                                                              expected: stored.value,
                                                              found });
                }
                true
            }
        };
        Ok(CacheLookup::Hit { record,
                              data_path,
                              verified })
    }
}
