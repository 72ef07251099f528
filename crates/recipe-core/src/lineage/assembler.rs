use std::collections::HashMap;

use super::LineageRecord;
use crate::errors::Result;
use crate::model::Artifact;
use crate::registry::ArtifactRegistry;

/// Arma registros de linaje a partir del `ArtifactRegistry` únicamente: no
/// recalcula checksums, sólo da formato. Los subárboles compartidos se
/// memoizan por nombre.
pub struct LineageAssembler<'a> {
    registry: &'a ArtifactRegistry,
    memo: HashMap<String, LineageRecord>,
}

impl<'a> LineageAssembler<'a> {
    pub fn new(registry: &'a ArtifactRegistry) -> Self {
        Self { registry,
               memo: HashMap::new() }
    }

    pub fn assemble(&mut self, name: &str) -> Result<LineageRecord> {
        if let Some(rec) = self.memo.get(name) {
            return Ok(rec.clone());
        }
        let artifact = self.registry.require(name)?;
        let mut lineage = Vec::with_capacity(artifact.lineage.len());
        // Raíces y mock-sources cortan la recursión: su `lineage` está vacío.
        for parent in &artifact.lineage {
            lineage.push(self.assemble(parent)?);
        }
        let rec = descriptor(artifact, lineage);
        self.memo.insert(name.to_string(), rec.clone());
        Ok(rec)
    }
}

fn descriptor(artifact: &Artifact, lineage: Vec<LineageRecord>) -> LineageRecord {
    LineageRecord { name: artifact.name.clone(),
                    path: artifact.relative_path_str(),
                    step_description: artifact.description.clone(),
                    role: artifact.role,
                    checksum: artifact.checksum.clone(),
                    instructions: artifact.code_fingerprint.clone(),
                    codified: artifact.codified.clone(),
                    fingerprint: artifact.fingerprint.clone(),
                    origin: artifact.origin.clone(),
                    recorded_at: artifact.recorded_at,
                    lineage }
}

/// Atajo para un único registro.
pub fn assemble(registry: &ArtifactRegistry, name: &str) -> Result<LineageRecord> {
    LineageAssembler::new(registry).assemble(name)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::Utc;

    use super::*;
    use crate::hashing::ChecksumAlgorithm;
    use crate::model::{Checksum, Provenance, Role};

    fn artifact(name: &str, role: Role, lineage: &[&str]) -> Artifact {
        Artifact { name: name.into(),
                   path: PathBuf::from(format!("/tmp/{name}")),
                   relative_path: Some(PathBuf::from(format!("{name}.txt"))),
                   role,
                   checksum: Some(Checksum::new(ChecksumAlgorithm::Md5, format!("sum-{name}"))),
                   code_fingerprint: format!("code-{name}"),
                   codified: format!("cod-{name}"),
                   fingerprint: format!("fp-{name}"),
                   description: Some(format!("{name} step")),
                   origin: None,
                   lineage: lineage.iter().map(|s| s.to_string()).collect(),
                   retained: true,
                   provenance: Provenance::Executed,
                   recorded_at: Utc::now() }
    }

    #[test]
    fn chain_is_nested_nearest_first() {
        let mut reg = ArtifactRegistry::new();
        reg.register(artifact("src", Role::Source, &[])).unwrap();
        reg.register(artifact("mid", Role::Intermediary, &["src"])).unwrap();
        reg.register(artifact("prod", Role::Product, &["mid"])).unwrap();

        let rec = assemble(&reg, "prod").unwrap();
        assert_eq!(rec.lineage.len(), 1);
        assert_eq!(rec.lineage[0].name, "mid");
        assert_eq!(rec.lineage[0].lineage[0].name, "src");
        assert_eq!(rec.lineage[0].lineage[0].checksum.as_ref().map(|c| c.value.as_str()), Some("sum-src"));
        assert_eq!(rec.path.as_deref(), Some("prod.txt"));
        assert_eq!(rec.instructions, "code-prod");
    }

    #[test]
    fn unknown_artifact_is_an_error() {
        let reg = ArtifactRegistry::new();
        assert!(assemble(&reg, "ghost").is_err());
    }
}
