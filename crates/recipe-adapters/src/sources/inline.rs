use std::fs;
use std::path::Path;

use recipe_core::step::BoxError;
use recipe_core::{ChecksumAlgorithm, SourceProducer};
use serde_json::{json, Value};

/// Fuente con bytes fijos embebidos en la receta (útil para tablas de
/// referencia pequeñas y para pruebas).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineBytes {
    label: String,
    bytes: Vec<u8>,
}

impl InlineBytes {
    pub fn new(label: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { label: label.into(),
               bytes: bytes.into() }
    }

    pub fn text(label: impl Into<String>, text: &str) -> Self {
        Self::new(label, text.as_bytes().to_vec())
    }
}

impl SourceProducer for InlineBytes {
    fn produce(&self, dest: &Path) -> Result<(), BoxError> {
        fs::write(dest, &self.bytes)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Inline data: {}", self.label)
    }

    fn descriptor(&self) -> Value {
        json!({ "kind": "inline", "label": self.label, "size": self.bytes.len() })
    }

    // Incluye el digest del contenido para que pickup no reutilice bytes viejos.
    fn definition(&self) -> Value {
        json!({ "inline": self.label, "content": ChecksumAlgorithm::Blake3.digest_bytes(&self.bytes) })
    }
}
