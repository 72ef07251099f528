//! Core RecipeEngine implementation

use std::path::PathBuf;

use indexmap::IndexMap;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::executor::{declare_mock, PreparedStep, StepExecutor};
use super::workspace::OutputTree;
use crate::cache::{plan_pickup, CacheKey, CacheLayer, CacheLookup, PickupNode, PickupPlan};
use crate::constants::ENGINE_VERSION;
use crate::errors::{RecipeError, Result};
use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use crate::hashing::hash_value;
use crate::lineage::{write_sidecar, LineageAssembler, LineageRecord};
use crate::model::{posix, Artifact, ArtifactFingerprintInput, CodifiedFingerprintInput, Provenance, Role};
use crate::recipe::Recipe;
use crate::registry::ArtifactRegistry;
use crate::resolver::{resolve, Resolution};
use crate::step::StepStatus;

/// Resultado de una corrida exitosa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Orden de ejecución resuelto (nombres de steps).
    pub order: Vec<String>,
    pub statuses: IndexMap<String, StepStatus>,
    /// Fingerprint de cada artifact registrado, incluidos los no retenidos.
    pub fingerprints: IndexMap<String, String>,
    /// Registro de linaje de cada artifact retenido.
    pub records: IndexMap<String, LineageRecord>,
    pub run_fingerprint: String,
}

impl RunSummary {
    pub fn status(&self, step: &str) -> Option<StepStatus> {
        self.statuses.get(step).copied()
    }

    pub fn fingerprint(&self, step: &str) -> Option<&str> {
        self.fingerprints.get(step).map(String::as_str)
    }

    pub fn record(&self, step: &str) -> Option<&LineageRecord> {
        self.records.get(step)
    }
}

/// Motor de ejecución de recetas
///
/// Orquesta resolver, cache, ejecución y linaje de forma estrictamente
/// secuencial. Cada corrida deja su journal en el `EventStore`.
#[derive(Debug, Default)]
pub struct RecipeEngine<E: EventStore = InMemoryEventStore> {
    event_store: E,
    last_run: Option<Uuid>,
}

impl RecipeEngine<InMemoryEventStore> {
    /// Crea un engine con journal en memoria
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: EventStore> RecipeEngine<E> {
    pub fn with_store(event_store: E) -> Self {
        Self { event_store,
               last_run: None }
    }

    pub fn event_store(&self) -> &E {
        &self.event_store
    }

    /// Id de la última corrida iniciada (también si falló).
    pub fn last_run_id(&self) -> Option<Uuid> {
        self.last_run
    }

    pub fn events_for(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.event_store.list(run_id)
    }

    /// Ejecuta la receta completa.
    ///
    /// Los errores de resolución y de salida indefinida abortan antes de
    /// ejecutar nada. Cualquier otro error detiene la corrida en el step que
    /// falló; los artifacts retenidos hasta ese punto ya tienen sidecar y
    /// sirven como cache para la próxima corrida.
    pub fn run(&mut self, recipe: &Recipe) -> Result<RunSummary> {
        let steps = recipe.steps();
        let resolution = resolve(steps)?;
        let retained: Vec<bool> = steps.iter()
                                       .zip(&resolution.roles)
                                       .map(|(s, role)| recipe.is_retained(s, *role))
                                       .collect();
        for (step, keep) in steps.iter().zip(&retained) {
            if *keep && step.output_spec().fixed().is_none() {
                return Err(RecipeError::UndefinedOutput { step: step.name().to_string() });
            }
        }
        let code_fps: Vec<String> = steps.iter().map(|s| s.instructions().code_fingerprint()).collect();
        let codified = codified_fingerprints(recipe, &resolution, &code_fps);

        let policy = recipe.policy();
        let tree = OutputTree::open(&policy.destination)?;
        let layer = CacheLayer::new(tree.data_root(), tree.metadata_root(), policy.checksum);
        let plan = if policy.pickup {
            let nodes: Vec<PickupNode<'_>> =
                steps.iter()
                     .enumerate()
                     .map(|(i, s)| PickupNode { name: s.name(),
                                                deps: resolution.deps[i].clone(),
                                                relative: s.output_spec().fixed().filter(|_| retained[i]),
                                                mode: recipe.cache_mode_for(s),
                                                codified: &codified[i],
                                                is_product: resolution.roles[i] == Role::Product })
                     .collect();
            Some(plan_pickup(&nodes, &layer)?)
        } else {
            None
        };

        let run_id = Uuid::new_v4();
        self.last_run = Some(run_id);
        let order: Vec<String> = resolution.order.iter().map(|&i| steps[i].name().to_string()).collect();
        self.event_store.append_kind(run_id,
                                     RunEventKind::RunInitialized { order: order.clone(),
                                                                    pickup: policy.pickup,
                                                                    engine_version: ENGINE_VERSION.to_string() });
        info!("recipe={} run_id={run_id} starting steps={} destination={}",
              recipe.name(),
              steps.len(),
              policy.destination.display());

        let mut run = RunState { recipe,
                                 resolution: &resolution,
                                 retained: &retained,
                                 code_fps: &code_fps,
                                 codified: &codified,
                                 tree: &tree,
                                 layer: &layer,
                                 plan: plan.as_ref(),
                                 registry: ArtifactRegistry::new(),
                                 run_id };
        let mut statuses: IndexMap<String, StepStatus> = order.iter().map(|n| (n.clone(), StepStatus::Pending)).collect();

        for (pos, &i) in resolution.order.iter().enumerate() {
            let name = steps[i].name().to_string();
            match run.process(&mut self.event_store, pos, i) {
                Ok(status) => {
                    statuses.insert(name, status);
                }
                Err(e) => {
                    statuses.insert(name.clone(), StepStatus::Failed);
                    error!("recipe={} step={name} failed: {e}", recipe.name());
                    self.event_store.append_kind(run_id,
                                                 RunEventKind::StepFailed { step_index: pos,
                                                                            step: name,
                                                                            error: e.clone() });
                    return Err(e);
                }
            }
        }

        // Registros finales + poda de archivos ajenos a la receta.
        let mut assembler = LineageAssembler::new(&run.registry);
        let mut records = IndexMap::new();
        let mut kept_paths = Vec::new();
        for &i in &resolution.order {
            let Some(artifact) = run.registry.get(steps[i].name()) else { continue };
            if !artifact.retained {
                continue;
            }
            records.insert(artifact.name.clone(), assembler.assemble(&artifact.name)?);
            if let Some(rel) = &artifact.relative_path {
                kept_paths.push(rel.clone());
            }
        }
        if policy.prune {
            let removed = tree.prune(&kept_paths)?;
            if !removed.is_empty() {
                warn!("recipe={} pruned {} unexpected files", recipe.name(), removed.len());
            }
        }

        let fingerprints: IndexMap<String, String> =
            resolution.order
                      .iter()
                      .filter_map(|&i| run.registry.get(steps[i].name()))
                      .map(|a| (a.name.clone(), a.fingerprint.clone()))
                      .collect();
        let product_fps: Vec<&str> = resolution.order
                                               .iter()
                                               .filter(|&&i| resolution.roles[i] == Role::Product)
                                               .filter_map(|&i| fingerprints.get(steps[i].name()))
                                               .map(String::as_str)
                                               .collect();
        let run_fingerprint = hash_value(&json!({ "products": product_fps }));
        self.event_store.append_kind(run_id,
                                     RunEventKind::RunCompleted { run_fingerprint: run_fingerprint.clone() });
        info!("recipe={} run_id={run_id} completed run_fingerprint={run_fingerprint}", recipe.name());

        Ok(RunSummary { run_id,
                        order,
                        statuses,
                        fingerprints,
                        records,
                        run_fingerprint })
    }
}

/// `codified = H(código, ruta declarada, codified de ancestros)`, calculable
/// sin ejecutar nada.
fn codified_fingerprints(recipe: &Recipe, resolution: &Resolution, code_fps: &[String]) -> Vec<String> {
    let steps = recipe.steps();
    let mut codified = vec![String::new(); steps.len()];
    for &i in &resolution.order {
        let lineage: Vec<String> = resolution.deps[i].iter().map(|&j| codified[j].clone()).collect();
        let path = steps[i].output_spec().fixed().map(posix);
        codified[i] = CodifiedFingerprintInput { instructions: &code_fps[i],
                                                 path: path.as_deref(),
                                                 lineage: &lineage }.fingerprint();
    }
    codified
}

/// Estado compartido por los steps de una corrida.
struct RunState<'a> {
    recipe: &'a Recipe,
    resolution: &'a Resolution,
    retained: &'a [bool],
    code_fps: &'a [String],
    codified: &'a [String],
    tree: &'a OutputTree,
    layer: &'a CacheLayer,
    plan: Option<&'a PickupPlan>,
    registry: ArtifactRegistry,
    run_id: Uuid,
}

impl RunState<'_> {
    fn process<E: EventStore>(&mut self, events: &mut E, pos: usize, i: usize) -> Result<StepStatus> {
        let step = &self.recipe.steps()[i];
        let prepared = PreparedStep { step,
                                      role: self.resolution.roles[i],
                                      code_fingerprint: &self.code_fps[i],
                                      codified: &self.codified[i],
                                      retained: self.retained[i] };

        if prepared.role == Role::MockSource {
            debug!("step={} declared as mock source", step.name());
            self.registry.register(declare_mock(&prepared, self.tree))?;
            return Ok(StepStatus::Declared);
        }

        if let Some(plan) = self.plan {
            if let Some(record) = plan.inherited.get(&i) {
                let artifact = self.inherited(&prepared, record)?;
                info!("step={} inherited fingerprint={}", step.name(), artifact.fingerprint);
                events.append_kind(self.run_id,
                                   RunEventKind::StepInherited { step: step.name().to_string(),
                                                                 fingerprint: artifact.fingerprint.clone() });
                self.registry.register(artifact)?;
                return Ok(StepStatus::Inherited);
            }
            if let Some(hit) = plan.satisfied.get(&i) {
                if let Some(status) = self.register_hit(events, &prepared, hit)? {
                    return Ok(status);
                }
            }
        }

        let mode = self.recipe.cache_mode_for(step);
        match step.output_spec().fixed().filter(|_| prepared.retained) {
            Some(rel) => {
                let parents = self.registry.fingerprints(step.dependencies())?;
                let key = CacheKey::Chain { instructions: prepared.code_fingerprint,
                                            lineage: &parents };
                match self.layer.lookup(step.name(), rel, mode, key)? {
                    hit @ CacheLookup::Hit { .. } => {
                        if let Some(status) = self.register_hit(events, &prepared, &hit)? {
                            return Ok(status);
                        }
                    }
                    CacheLookup::Miss { reason } => {
                        debug!("step={} cache miss: {reason}", step.name());
                        events.append_kind(self.run_id,
                                           RunEventKind::CacheMiss { step: step.name().to_string(),
                                                                     reason });
                    }
                }
            }
            None => {
                events.append_kind(self.run_id,
                                   RunEventKind::CacheMiss { step: step.name().to_string(),
                                                             reason: "not retained".into() });
            }
        }

        events.append_kind(self.run_id,
                           RunEventKind::StepStarted { step_index: pos,
                                                       step: step.name().to_string() });
        let executor = StepExecutor { tree: self.tree,
                                      algorithm: self.recipe.policy().checksum };
        let mut artifact = executor.execute(&prepared, &self.registry)?;
        let checksum = artifact.checksum.as_ref().map(|c| c.value.clone());
        let fingerprint = artifact.fingerprint.clone();

        let retained_at = match (&artifact.relative_path, artifact.retained) {
            (Some(rel), true) => Some(self.tree.retain(&artifact.path, rel)?),
            _ => None,
        };
        if let Some(dest) = &retained_at {
            artifact.path = dest.clone();
        }
        let relative = artifact.relative_path.clone();
        self.registry.register(artifact)?;

        if let (Some(_), Some(rel)) = (retained_at, relative) {
            self.persist(events, step.name(), &rel)?;
        }
        events.append_kind(self.run_id,
                           RunEventKind::StepFinished { step_index: pos,
                                                        step: step.name().to_string(),
                                                        checksum,
                                                        fingerprint: fingerprint.clone() });
        info!("step={} finished fingerprint={fingerprint}", step.name());
        Ok(StepStatus::FinishedOk)
    }

    /// Escribe el sidecar apenas el artifact queda registrado, para que una
    /// corrida interrumpida más adelante lo pueda reutilizar.
    fn persist<E: EventStore>(&self, events: &mut E, name: &str, rel: &std::path::Path) -> Result<()> {
        let record = LineageAssembler::new(&self.registry).assemble(name)?;
        let path = self.tree.sidecar_path(rel);
        write_sidecar(&path, &record)?;
        debug!("step={name} metadata written path={}", path.display());
        events.append_kind(self.run_id,
                           RunEventKind::MetadataWritten { step: name.to_string(),
                                                           path: posix(rel) });
        Ok(())
    }

    /// Registra un hit de cache. Si el fingerprint recalculado con los
    /// ancestros de esta corrida no coincide con el del sidecar (un ancestro
    /// se re-ejecutó con otro resultado), el hit se descarta como miss y
    /// devuelve `None`: el step se ejecuta y su sidecar se reescribe.
    fn register_hit<E: EventStore>(&mut self,
                                   events: &mut E,
                                   prepared: &PreparedStep<'_>,
                                   hit: &CacheLookup)
                                   -> Result<Option<StepStatus>> {
        let CacheLookup::Hit { record, data_path, verified } = hit else {
            return Err(RecipeError::Internal("cache miss registered as hit".into()));
        };
        let step = prepared.step;
        let parents = self.registry.fingerprints(step.dependencies())?;
        let fingerprint = ArtifactFingerprintInput { instructions: prepared.code_fingerprint,
                                                     checksum: record.checksum.as_ref(),
                                                     lineage: &parents }.fingerprint();
        if fingerprint != record.fingerprint {
            warn!("step={} cached fingerprint {} differs from recomputed {fingerprint}; discarding cache",
                  step.name(),
                  record.fingerprint);
            events.append_kind(self.run_id,
                               RunEventKind::CacheMiss { step: step.name().to_string(),
                                                         reason: "stale lineage".into() });
            return Ok(None);
        }
        info!("step={} cache hit verified={verified} fingerprint={fingerprint}", step.name());
        events.append_kind(self.run_id,
                           RunEventKind::CacheHit { step: step.name().to_string(),
                                                    fingerprint: fingerprint.clone(),
                                                    verified: *verified });
        self.registry.register(Artifact { name: step.name().to_string(),
                                          path: data_path.clone(),
                                          relative_path: step.output_spec().fixed().map(|p| p.to_path_buf()),
                                          role: prepared.role,
                                          checksum: record.checksum.clone(),
                                          code_fingerprint: prepared.code_fingerprint.to_string(),
                                          codified: prepared.codified.to_string(),
                                          fingerprint,
                                          description: step.step_description(),
                                          origin: step.instructions().origin(),
                                          lineage: step.dependencies().into_iter().map(str::to_string).collect(),
                                          retained: true,
                                          provenance: Provenance::Cached,
                                          recorded_at: record.recorded_at })?;
        Ok(Some(StepStatus::Cached))
    }

    /// Artifact reconstruido desde un registro de linaje almacenado. No se
    /// materializa: si estaba retenido en la corrida previa, su archivo sigue
    /// en `data/`.
    fn inherited(&self, prepared: &PreparedStep<'_>, record: &LineageRecord) -> Result<Artifact> {
        let step = prepared.step;
        let relative: Option<PathBuf> = step.output_spec().fixed().map(|p| p.to_path_buf());
        let path = relative.as_ref().map(|r| self.tree.data_path(r)).unwrap_or_default();
        let on_disk = path.is_file();
        if prepared.retained && !on_disk {
            warn!("step={} inherited but {} is not on disk; not retained", step.name(), path.display());
        }
        let parents = self.registry.fingerprints(step.dependencies())?;
        let fingerprint = ArtifactFingerprintInput { instructions: prepared.code_fingerprint,
                                                     checksum: record.checksum.as_ref(),
                                                     lineage: &parents }.fingerprint();
        Ok(Artifact { name: step.name().to_string(),
                      path,
                      relative_path: relative,
                      role: prepared.role,
                      checksum: record.checksum.clone(),
                      code_fingerprint: prepared.code_fingerprint.to_string(),
                      codified: prepared.codified.to_string(),
                      fingerprint,
                      description: step.step_description(),
                      origin: step.instructions().origin(),
                      lineage: step.dependencies().into_iter().map(str::to_string).collect(),
                      retained: prepared.retained && on_disk,
                      provenance: Provenance::Inherited,
                      recorded_at: record.recorded_at })
    }
}
