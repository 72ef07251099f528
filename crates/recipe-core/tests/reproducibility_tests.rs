mod common;

use recipe_core::{verify_reproducible, Recipe, RecipeEngine, Step};

use common::{abc_recipe, Stamp};

#[test]
fn deterministic_recipe_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = abc_recipe(dir.path()).build().unwrap();
    RecipeEngine::new().run(&recipe).unwrap();

    let diff = verify_reproducible(&recipe).unwrap();
    assert!(diff.is_identical(), "{diff:?}");
}

#[test]
fn nondeterministic_output_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = Recipe::builder("stamp").destination(dir.path())
                                         .step(Step::new("stamp", Stamp::default()).output("stamp.txt"))
                                         .build()
                                         .unwrap();
    RecipeEngine::new().run(&recipe).unwrap();

    let diff = verify_reproducible(&recipe).unwrap();
    assert_eq!(diff.differing, vec!["stamp.txt.json"]);
    assert!(diff.only_in_left.is_empty() && diff.only_in_right.is_empty());
}
