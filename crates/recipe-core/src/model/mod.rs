//! Modelos neutrales (Artifact, Role, Checksum, fingerprints, ExecutionContext).

pub mod artifact;
pub mod context;
pub mod fingerprint;

pub use artifact::{posix, Artifact, Checksum, Provenance, Role};
pub use context::ExecutionContext;
pub use fingerprint::{code_fingerprint, ArtifactFingerprintInput, CodifiedFingerprintInput};
