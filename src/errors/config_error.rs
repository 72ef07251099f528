use thiserror::Error;

/// Errores al leer la configuración de corrida desde el entorno.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("{key} is set but empty")]
    Empty { key: String },
}

impl ConfigError {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue { key: key.to_string(),
                             reason: reason.into() }
    }
}
