//! Configuración de corrida desde variables de entorno.
//! El archivo `.env` se carga una sola vez y de forma perezosa; los valores
//! ausentes dejan intacta la política declarada en la receta.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use dotenvy::dotenv;
use log::debug;
use once_cell::sync::Lazy;
use recipe_core::{CacheMode, ChecksumAlgorithm, RecipeBuilder, Role};

use crate::errors::ConfigError;

pub const DESTINATION_VAR: &str = "RECIPE_DESTINATION";
pub const KEEP_VAR: &str = "RECIPE_KEEP";
pub const CACHE_MODE_VAR: &str = "RECIPE_CACHE_MODE";
pub const PICKUP_VAR: &str = "RECIPE_PICKUP";
pub const CHECKSUM_VAR: &str = "RECIPE_CHECKSUM";
pub const PRUNE_VAR: &str = "RECIPE_PRUNE";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Política de corrida leída del entorno. `None` significa "no definido".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeConfig {
    pub destination: Option<PathBuf>,
    pub keep: Option<Vec<Role>>,
    pub cache_mode: Option<CacheMode>,
    pub pickup: Option<bool>,
    pub checksum: Option<ChecksumAlgorithm>,
    pub prune: Option<bool>,
}

impl RecipeConfig {
    /// Lee `RECIPE_*` del entorno del proceso (y de `.env` si existe).
    pub fn from_env() -> Result<Self, ConfigError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        let get = |key: &str| -> Result<Option<String>, ConfigError> {
            match lookup(key) {
                None => Ok(None),
                Some(v) if v.trim().is_empty() => Err(ConfigError::Empty { key: key.to_string() }),
                Some(v) => Ok(Some(v.trim().to_string())),
            }
        };

        let keep = match get(KEEP_VAR)? {
            Some(raw) => Some(raw.split(',')
                                 .map(str::trim)
                                 .filter(|r| !r.is_empty())
                                 .map(|r| parse::<Role>(KEEP_VAR, r))
                                 .collect::<Result<Vec<_>, _>>()?),
            None => None,
        };
        let config = Self { destination: get(DESTINATION_VAR)?.map(PathBuf::from),
                            keep,
                            cache_mode: get(CACHE_MODE_VAR)?.map(|v| parse(CACHE_MODE_VAR, &v)).transpose()?,
                            pickup: get(PICKUP_VAR)?.map(|v| parse_bool(PICKUP_VAR, &v)).transpose()?,
                            checksum: get(CHECKSUM_VAR)?.map(|v| parse(CHECKSUM_VAR, &v)).transpose()?,
                            prune: get(PRUNE_VAR)?.map(|v| parse_bool(PRUNE_VAR, &v)).transpose()? };
        debug!("recipe config loaded: {config:?}");
        Ok(config)
    }

    /// Aplica sobre el builder sólo los valores definidos.
    pub fn apply(&self, mut builder: RecipeBuilder) -> RecipeBuilder {
        if let Some(dest) = &self.destination {
            builder = builder.destination(dest.clone());
        }
        if let Some(keep) = &self.keep {
            builder = builder.keep(keep.iter().copied());
        }
        if let Some(mode) = self.cache_mode {
            builder = builder.cache_mode(mode);
        }
        if let Some(pickup) = self.pickup {
            builder = builder.pickup(pickup);
        }
        if let Some(algorithm) = self.checksum {
            builder = builder.checksum(algorithm);
        }
        if let Some(prune) = self.prune {
            builder = builder.prune(prune);
        }
        builder
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

fn parse<T: FromStr<Err = String>>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|e: String| ConfigError::invalid(key, e))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(key, format!("expected a boolean, got '{other}'"))),
    }
}
