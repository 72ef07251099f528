//! Comparación de dos paquetes (árboles `metadata/`) entre corridas.
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::strip_incidental;
use crate::constants::METADATA_DIR;
use crate::engine::workspace::list_files;
use crate::errors::{RecipeError, Result};
use crate::model::posix;

/// Diferencias entre dos paquetes, por ruta relativa de sidecar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDiff {
    pub only_in_left: Vec<String>,
    pub only_in_right: Vec<String>,
    pub differing: Vec<String>,
}

impl PackageDiff {
    pub fn is_identical(&self) -> bool {
        self.only_in_left.is_empty() && self.only_in_right.is_empty() && self.differing.is_empty()
    }
}

/// Compara los sidecars de dos destinos ignorando campos incidentales.
pub fn compare_packages(left: &Path, right: &Path) -> Result<PackageDiff> {
    let left_root = left.join(METADATA_DIR);
    let right_root = right.join(METADATA_DIR);
    let lhs: BTreeSet<String> = list_files(&left_root)?.iter().map(|p| posix(p)).collect();
    let rhs: BTreeSet<String> = list_files(&right_root)?.iter().map(|p| posix(p)).collect();

    let mut diff = PackageDiff { only_in_left: lhs.difference(&rhs).cloned().collect(),
                                 only_in_right: rhs.difference(&lhs).cloned().collect(),
                                 differing: Vec::new() };
    for rel in lhs.intersection(&rhs) {
        if comparable(&left_root.join(rel))? != comparable(&right_root.join(rel))? {
            diff.differing.push(rel.clone());
        }
    }
    Ok(diff)
}

fn comparable(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| RecipeError::io(path, e))?;
    let mut value: Value = serde_json::from_str(&text).map_err(|e| RecipeError::metadata(path, e))?;
    strip_incidental(&mut value);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, body: &str) {
        let p = root.join(METADATA_DIR).join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, body).unwrap();
    }

    #[test]
    fn timestamps_are_ignored_but_content_is_not() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write(a.path(), "x.txt.json", r#"{"fingerprint":"1","recorded_at":"t1"}"#);
        write(b.path(), "x.txt.json", r#"{"fingerprint":"1","recorded_at":"t2"}"#);
        write(a.path(), "d/y.txt.json", r#"{"fingerprint":"1"}"#);
        write(b.path(), "d/y.txt.json", r#"{"fingerprint":"2"}"#);
        write(a.path(), "only_a.json", "{}");
        write(b.path(), "only_b.json", "{}");

        let diff = compare_packages(a.path(), b.path()).unwrap();
        assert_eq!(diff.differing, vec!["d/y.txt.json"]);
        assert_eq!(diff.only_in_left, vec!["only_a.json"]);
        assert_eq!(diff.only_in_right, vec!["only_b.json"]);
        assert!(!diff.is_identical());
    }

    #[test]
    fn missing_metadata_roots_compare_equal() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        assert!(compare_packages(a.path(), b.path()).unwrap().is_identical());
    }
}
