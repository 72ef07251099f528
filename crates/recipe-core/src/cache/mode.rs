use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Política frente a un artifact ya presente en el árbol de salida.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Recalcula el checksum del archivo cacheado; si no coincide con el
    /// sidecar la corrida falla con `CacheCorruption`.
    #[default]
    Verify,
    /// Acepta el checksum almacenado sin releer el archivo.
    Trust,
    /// Ignora la cache: el step siempre se ejecuta.
    Refresh,
}

impl CacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Verify => "verify",
            CacheMode::Trust => "trust",
            CacheMode::Refresh => "refresh",
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verify" => Ok(CacheMode::Verify),
            "trust" => Ok(CacheMode::Trust),
            "refresh" => Ok(CacheMode::Refresh),
            other => Err(format!("unknown cache mode '{other}'")),
        }
    }
}
