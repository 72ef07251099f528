//! Step Executor: invoca las instrucciones ante un miss, valida la salida y
//! construye el artifact resultante.
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use chrono::Utc;
use indexmap::IndexMap;
use log::debug;

use super::workspace::OutputTree;
use crate::constants::TEMPORARY_OUTPUT_NAME;
use crate::errors::{RecipeError, Result};
use crate::hashing::ChecksumAlgorithm;
use crate::model::{Artifact, ArtifactFingerprintInput, Checksum, ExecutionContext, Provenance, Role};
use crate::registry::ArtifactRegistry;
use crate::step::{OutputSpec, Step, StepRunResult};

/// Datos del step ya resueltos por el run loop.
pub(crate) struct PreparedStep<'a> {
    pub step: &'a Step,
    pub role: Role,
    pub code_fingerprint: &'a str,
    pub codified: &'a str,
    pub retained: bool,
}

pub(crate) struct StepExecutor<'a> {
    pub tree: &'a OutputTree,
    pub algorithm: ChecksumAlgorithm,
}

impl StepExecutor<'_> {
    /// Ejecuta las instrucciones en un workspace propio. El archivo queda en
    /// el workspace; retenerlo es responsabilidad del caller.
    pub fn execute(&self, prepared: &PreparedStep<'_>, registry: &ArtifactRegistry) -> Result<Artifact> {
        let step = prepared.step;
        let mut ingredients = IndexMap::with_capacity(step.ingredients().len());
        for (binding, source) in step.ingredients() {
            ingredients.insert(binding.clone(), registry.require(source)?.path.clone());
        }

        let workspace = self.tree.step_workspace()?;
        let (output, relative) = match step.output_spec() {
            OutputSpec::Fixed(rel) => (workspace.join(rel), Some(rel.clone())),
            OutputSpec::Temporary => (workspace.join(TEMPORARY_OUTPUT_NAME), None),
        };
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| RecipeError::io(parent, e))?;
        }

        let ctx = ExecutionContext { step: step.name().to_string(),
                                     ingredients,
                                     output: output.clone(),
                                     workspace };
        debug!("step={} running instructions output={}", step.name(), output.display());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| step.instructions().run(&ctx)));
        let failure = match outcome {
            Ok(StepRunResult::Success) => None,
            Ok(StepRunResult::Failure { reason }) => Some(reason),
            Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref()))),
        };
        if let Some(reason) = failure {
            return Err(RecipeError::StepExecutionFailed { step: step.name().to_string(),
                                                          reason });
        }

        if !output.is_file() {
            let declared = relative.as_ref().map(|r| r.display().to_string()).unwrap_or_else(|| output.display().to_string());
            return Err(RecipeError::MissingOutput { step: step.name().to_string(),
                                                    path: declared });
        }
        let value = self.algorithm.digest_file(&output).map_err(|e| RecipeError::io(&output, e))?;
        let checksum = Checksum::new(self.algorithm, value);

        let lineage: Vec<String> = step.dependencies().into_iter().map(str::to_string).collect();
        let parents = registry.fingerprints(step.dependencies())?;
        let fingerprint = ArtifactFingerprintInput { instructions: prepared.code_fingerprint,
                                                     checksum: Some(&checksum),
                                                     lineage: &parents }.fingerprint();

        Ok(Artifact { name: step.name().to_string(),
                      path: output,
                      relative_path: relative,
                      role: prepared.role,
                      checksum: Some(checksum),
                      code_fingerprint: prepared.code_fingerprint.to_string(),
                      codified: prepared.codified.to_string(),
                      fingerprint,
                      description: step.step_description(),
                      origin: step.instructions().origin(),
                      lineage,
                      retained: prepared.retained,
                      provenance: Provenance::Executed,
                      recorded_at: Utc::now() })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic payload"
    }
}

/// Artifact de un `mock-source`: sin checksum y sin ejecutar nada.
pub(crate) fn declare_mock(prepared: &PreparedStep<'_>, tree: &OutputTree) -> Artifact {
    let step = prepared.step;
    let relative: Option<PathBuf> = step.output_spec().fixed().map(|p| p.to_path_buf());
    let path = relative.as_ref().map(|r| tree.data_path(r)).unwrap_or_default();
    let fingerprint = ArtifactFingerprintInput { instructions: prepared.code_fingerprint,
                                                 checksum: None,
                                                 lineage: &[] }.fingerprint();
    Artifact { name: step.name().to_string(),
               path,
               relative_path: relative,
               role: prepared.role,
               checksum: None,
               code_fingerprint: prepared.code_fingerprint.to_string(),
               codified: prepared.codified.to_string(),
               fingerprint,
               description: step.step_description(),
               origin: step.instructions().origin(),
               lineage: Vec::new(),
               retained: false,
               provenance: Provenance::Declared,
               recorded_at: Utc::now() }
}
