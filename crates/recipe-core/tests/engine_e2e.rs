mod common;

use common::{abc_recipe, read, read_json};
use recipe_core::{RecipeEngine, RunEventKind, StepStatus};

#[test]
fn abc_uppercase_twice_gives_identical_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = abc_recipe(dir.path()).build().unwrap();

    let first = RecipeEngine::new().run(&recipe).expect("first run");
    assert_eq!(first.order, vec!["source", "upper"]);
    assert_eq!(first.status("upper"), Some(StepStatus::FinishedOk));
    assert_eq!(read(dir.path().join("data/upper.txt")), "ABC");

    let second = RecipeEngine::new().run(&recipe).expect("second run");
    assert_eq!(second.status("upper"), Some(StepStatus::Cached));
    assert_eq!(first.fingerprint("upper"), second.fingerprint("upper"));
    assert_eq!(first.run_fingerprint, second.run_fingerprint);

    let meta = read_json(dir.path().join("metadata/upper.txt.json"));
    let lineage = meta["lineage"].as_array().expect("lineage array");
    assert_eq!(lineage.len(), 1);
    assert_eq!(lineage[0]["name"], "source");
}

#[test]
fn sidecar_has_the_persisted_record_shape() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = abc_recipe(dir.path()).build().unwrap();
    let summary = RecipeEngine::new().run(&recipe).unwrap();

    let meta = read_json(dir.path().join("metadata/upper.txt.json"));
    assert_eq!(meta["name"], "upper");
    assert_eq!(meta["path"], "upper.txt");
    assert_eq!(meta["role"], "product");
    assert_eq!(meta["step_description"], "Uppercase a text ingredient");
    assert_eq!(meta["checksum"]["algorithm"], "md5");
    assert_eq!(meta["fingerprint"], summary.fingerprint("upper").unwrap());
    assert!(meta.get("origin").is_none());

    let source = &meta["lineage"][0];
    assert_eq!(source["role"], "source");
    assert_eq!(source["path"], serde_json::Value::Null);
    assert_eq!(source["checksum"]["value"], "900150983cd24fb0d6963f7d28e17f72");
    assert_eq!(source["origin"]["kind"], "inline");
    assert!(source.get("lineage").is_none());

    // Sólo el producto se retiene; la fuente temporal no deja rastros.
    assert_eq!(summary.records.len(), 1);
    assert!(!dir.path().join("metadata/source.json").exists());
}

#[test]
fn journal_records_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = abc_recipe(dir.path()).build().unwrap();
    let mut engine = RecipeEngine::new();
    let summary = engine.run(&recipe).unwrap();

    let events = engine.events_for(summary.run_id);
    assert!(matches!(events.first().map(|e| &e.kind), Some(RunEventKind::RunInitialized { .. })));
    assert!(matches!(events.last().map(|e| &e.kind),
                     Some(RunEventKind::RunCompleted { run_fingerprint }) if *run_fingerprint == summary.run_fingerprint));
    assert!(events.iter()
                  .any(|e| matches!(&e.kind, RunEventKind::MetadataWritten { step, path } if step == "upper" && path == "upper.txt")));
    let finished = events.iter()
                         .filter(|e| matches!(e.kind, RunEventKind::StepFinished { .. }))
                         .count();
    assert_eq!(finished, 2);
    assert!(events.windows(2).all(|w| w[0].seq + 1 == w[1].seq));
}

#[test]
fn run_workspace_is_cleaned_up() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = abc_recipe(dir.path()).build().unwrap();
    RecipeEngine::new().run(&recipe).unwrap();

    let mut entries: Vec<String> = std::fs::read_dir(dir.path()).unwrap()
                                                                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                                                                .collect();
    entries.sort();
    assert_eq!(entries, vec!["data", "metadata"]);
}
