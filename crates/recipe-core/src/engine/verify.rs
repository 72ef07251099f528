use log::info;

use super::RecipeEngine;
use crate::errors::{RecipeError, Result};
use crate::lineage::{compare_packages, PackageDiff};
use crate::recipe::Recipe;

/// Re-ejecuta la receta en un destino temporal limpio y compara los
/// sidecars con los del destino original.
///
/// Un paquete reproducible produce un `PackageDiff` vacío.
pub fn verify_reproducible(recipe: &Recipe) -> Result<PackageDiff> {
    let scratch = tempfile::Builder::new().prefix("recipe-verify-")
                                          .tempdir()
                                          .map_err(|e| RecipeError::io(&std::env::temp_dir(), e))?;
    let copy = recipe.with_destination(scratch.path());
    RecipeEngine::new().run(&copy)?;
    let diff = compare_packages(recipe.destination(), scratch.path())?;
    info!("recipe={} reproducible={} differing={} only_in_package={} only_in_rerun={}",
          recipe.name(),
          diff.is_identical(),
          diff.differing.len(),
          diff.only_in_left.len(),
          diff.only_in_right.len());
    Ok(diff)
}
