use serde_json::{json, Value};

use super::Checksum;
use crate::hashing::hash_value;

/// Insumos del fingerprint de un artifact.
/// NO es el fingerprint final (string hash) sino el modelo previo a canonicalizar.
///
/// `fingerprint = H(instructions ‖ checksum ‖ lineage)`, con `lineage` en el
/// orden de declaración de ingredientes. Un step raíz tiene `lineage` vacío.
pub struct ArtifactFingerprintInput<'a> {
    pub instructions: &'a str,
    pub checksum: Option<&'a Checksum>,
    pub lineage: &'a [String],
}

impl ArtifactFingerprintInput<'_> {
    pub fn to_value(&self) -> Value {
        json!({
            "instructions": self.instructions,
            "checksum": self.checksum.map(|c| json!({"algorithm": c.algorithm, "value": c.value})),
            "lineage": self.lineage,
        })
    }

    pub fn fingerprint(&self) -> String {
        hash_value(&self.to_value())
    }
}

/// Insumos del fingerprint "codified": todo lo que se conoce por la sola
/// declaración de la receta, sin ejecutar nada.
pub struct CodifiedFingerprintInput<'a> {
    pub instructions: &'a str,
    pub path: Option<&'a str>,
    pub lineage: &'a [String],
}

impl CodifiedFingerprintInput<'_> {
    pub fn fingerprint(&self) -> String {
        hash_value(&json!({
            "instructions": self.instructions,
            "path": self.path,
            "lineage": self.lineage,
        }))
    }
}

/// Fingerprint de código a partir del contenido que define la lógica.
pub fn code_fingerprint(definition: &Value) -> String {
    hash_value(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::ChecksumAlgorithm;

    fn fp(instructions: &str, value: &str, lineage: &[String]) -> String {
        let c = Checksum::new(ChecksumAlgorithm::Md5, value);
        ArtifactFingerprintInput { instructions,
                                   checksum: Some(&c),
                                   lineage }.fingerprint()
    }

    #[test]
    fn every_component_changes_the_fingerprint() {
        let base = fp("code", "aa", &["p1".into()]);
        assert_eq!(base, fp("code", "aa", &["p1".into()]));
        assert_ne!(base, fp("code2", "aa", &["p1".into()]));
        assert_ne!(base, fp("code", "ab", &["p1".into()]));
        assert_ne!(base, fp("code", "aa", &["p2".into()]));
        assert_ne!(base, fp("code", "aa", &[]));
    }

    #[test]
    fn lineage_order_matters() {
        assert_ne!(fp("c", "x", &["a".into(), "b".into()]), fp("c", "x", &["b".into(), "a".into()]));
    }
}
