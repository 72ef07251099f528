//! Hash helpers – abstracción para cambiar de algoritmo sin tocar el resto del core.
//!
//! Dos familias de digest conviven aquí:
//! - `hash_str` / `hash_value`: blake3 sobre JSON canónico. Se usa para
//!   fingerprints (código, codified, artifact, corrida). No es configurable.
//! - `ChecksumAlgorithm`: digest del contenido crudo de un archivo. Por
//!   defecto MD5, configurable por receta.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::canonical_json::to_canonical_json;

const READ_CHUNK: usize = 64 * 1024;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hashea un `Value` en su forma canónica.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

/// Algoritmo de checksum de contenido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Md5,
    Sha256,
    Blake3,
}

impl ChecksumAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    /// Digest hex de un buffer en memoria.
    pub fn digest_bytes(&self, bytes: &[u8]) -> String {
        let mut d = ContentDigest::new(*self);
        d.update(bytes);
        d.finalize()
    }

    /// Digest hex de un archivo, leído por bloques.
    pub fn digest_file(&self, path: &Path) -> std::io::Result<String> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut d = ContentDigest::new(*self);
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            d.update(&buf[..n]);
        }
        Ok(d.finalize())
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!("unsupported checksum algorithm '{other}'")),
        }
    }
}

/// Estado incremental de un digest de contenido.
enum ContentDigest {
    Md5(md5::Context),
    Sha256(Sha256),
    Blake3(Box<Hasher>),
}

impl ContentDigest {
    fn new(alg: ChecksumAlgorithm) -> Self {
        match alg {
            ChecksumAlgorithm::Md5 => Self::Md5(md5::Context::new()),
            ChecksumAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            ChecksumAlgorithm::Blake3 => Self::Blake3(Box::new(Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Md5(c) => c.consume(bytes),
            Self::Sha256(h) => h.update(bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finalize(self) -> String {
        match self {
            Self::Md5(c) => format!("{:x}", c.compute()),
            Self::Sha256(h) => format!("{:x}", h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn hash_value_ignores_key_order() {
        assert_eq!(hash_value(&json!({"b": 2, "a": 1})), hash_value(&json!({"a": 1, "b": 2})));
        assert_eq!(hash_value(&json!({"a": 1})).len(), 64);
    }

    #[test]
    fn known_digests_of_abc() {
        assert_eq!(ChecksumAlgorithm::Md5.digest_bytes(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(ChecksumAlgorithm::Sha256.digest_bytes(b"abc"),
                   "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(ChecksumAlgorithm::Blake3.digest_bytes(b"abc").len(), 64);
    }

    #[test]
    fn file_digest_matches_memory_digest() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        let data = vec![7u8; READ_CHUNK * 2 + 13];
        f.write_all(&data).unwrap();
        for alg in [ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha256, ChecksumAlgorithm::Blake3] {
            assert_eq!(alg.digest_file(f.path()).unwrap(), alg.digest_bytes(&data), "{alg}");
        }
    }

    #[test]
    fn parses_algorithm_names() {
        assert_eq!("MD5".parse::<ChecksumAlgorithm>(), Ok(ChecksumAlgorithm::Md5));
        assert_eq!(" sha256 ".parse::<ChecksumAlgorithm>(), Ok(ChecksumAlgorithm::Sha256));
        assert!("crc32".parse::<ChecksumAlgorithm>().is_err());
    }
}
