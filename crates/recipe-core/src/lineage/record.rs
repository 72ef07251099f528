//! Registro de linaje persistido por cada artifact retenido.
//!
//! Forma JSON: descriptor propio + `lineage` con los ancestros directos
//! (mismo formato, recursivo, en orden de declaración de ingredientes). Es
//! también el formato que lee la capa de cache en corridas posteriores.
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ArtifactFingerprintInput, Checksum, Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageRecord {
    pub name: String,
    /// Ruta relativa al árbol `data/`; `null` para salidas temporales.
    pub path: Option<String>,
    pub step_description: Option<String>,
    pub role: Role,
    pub checksum: Option<Checksum>,
    /// Fingerprint de código de las instrucciones.
    pub instructions: String,
    pub codified: String,
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Value>,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lineage: Vec<LineageRecord>,
}

impl LineageRecord {
    /// Fingerprints de los ancestros directos, en orden.
    pub fn ancestor_fingerprints(&self) -> Vec<String> {
        self.lineage.iter().map(|r| r.fingerprint.clone()).collect()
    }

    /// Descriptor propio seguido de todos los ancestros, en profundidad
    /// (más cercano primero) y sin repetir artifacts compartidos.
    pub fn flatten(&self) -> Vec<&LineageRecord> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        Self::walk(self, &mut seen, &mut out);
        out
    }

    fn walk<'a>(rec: &'a LineageRecord, seen: &mut HashSet<&'a str>, out: &mut Vec<&'a LineageRecord>) {
        if !seen.insert(rec.fingerprint.as_str()) {
            return;
        }
        out.push(rec);
        for parent in &rec.lineage {
            Self::walk(parent, seen, out);
        }
    }

    /// Busca en el linaje (incluido el propio registro) por codified.
    pub fn find_codified(&self, codified: &str) -> Option<&LineageRecord> {
        self.flatten().into_iter().find(|r| r.codified == codified)
    }

    /// `true` si el fingerprint almacenado es coherente con los campos del
    /// propio registro (instrucciones, checksum y ancestros).
    pub fn is_consistent(&self) -> bool {
        let lineage = self.ancestor_fingerprints();
        let expected = ArtifactFingerprintInput { instructions: &self.instructions,
                                                  checksum: self.checksum.as_ref(),
                                                  lineage: &lineage }.fingerprint();
        expected == self.fingerprint
    }

    /// Representación JSON sin campos incidentales (`recorded_at`), usada
    /// para comparar paquetes entre corridas.
    pub fn comparable(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        strip_incidental(&mut value);
        value
    }
}

/// Elimina `recorded_at` de un sidecar (y de todo su linaje).
pub(crate) fn strip_incidental(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("recorded_at");
            for v in map.values_mut() {
                strip_incidental(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_incidental),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::ChecksumAlgorithm;

    fn record(name: &str, lineage: Vec<LineageRecord>) -> LineageRecord {
        let checksum = Checksum::new(ChecksumAlgorithm::Md5, format!("sum-{name}"));
        let parents: Vec<String> = lineage.iter().map(|r| r.fingerprint.clone()).collect();
        let fingerprint = ArtifactFingerprintInput { instructions: name,
                                                     checksum: Some(&checksum),
                                                     lineage: &parents }.fingerprint();
        LineageRecord { name: name.into(),
                        path: Some(format!("{name}.txt")),
                        step_description: None,
                        role: if lineage.is_empty() { Role::Source } else { Role::Intermediary },
                        checksum: Some(checksum),
                        instructions: name.into(),
                        codified: format!("cod-{name}"),
                        fingerprint,
                        origin: None,
                        recorded_at: Utc::now(),
                        lineage }
    }

    #[test]
    fn flatten_is_depth_first_and_deduplicated() {
        let src = record("src", vec![]);
        let left = record("left", vec![src.clone()]);
        let right = record("right", vec![src.clone()]);
        let join = record("join", vec![left, right]);
        let names: Vec<&str> = join.flatten().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["join", "left", "src", "right"]);
        assert_eq!(join.find_codified("cod-src").map(|r| r.name.as_str()), Some("src"));
    }

    #[test]
    fn empty_lineage_is_omitted_and_timestamps_are_not_comparable() {
        let src = record("src", vec![]);
        let json = serde_json::to_value(&src).unwrap();
        assert!(json.get("lineage").is_none());
        assert!(json.get("origin").is_none());
        assert!(json.get("recorded_at").is_some());

        let mut later = src.clone();
        later.recorded_at = Utc::now() + chrono::Duration::seconds(5);
        assert_ne!(src, later);
        assert_eq!(src.comparable(), later.comparable());
    }

    #[test]
    fn tampered_fingerprint_is_detected() {
        let mut src = record("src", vec![]);
        assert!(src.is_consistent());
        src.checksum = Some(Checksum::new(ChecksumAlgorithm::Md5, "other"));
        assert!(!src.is_consistent());
    }
}
