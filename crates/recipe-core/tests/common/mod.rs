#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use recipe_adapters::{InlineBytes, Uppercase};
use recipe_core::{ExecutionContext, Instructions, Recipe, RecipeBuilder, Step, StepRunResult};
use serde_json::{json, Value};

/// `source` (texto fijo "abc", temporal) -> `upper` (producto `upper.txt`).
pub fn abc_recipe(dest: &Path) -> RecipeBuilder {
    Recipe::builder("abc").destination(dest)
                          .step(Step::source("source", InlineBytes::text("abc", "abc")))
                          .step(Step::new("upper", Uppercase::new("text".into())).ingredient("text", "source")
                                                                                 .output("upper.txt"))
}

/// Mayúsculas que cuenta cuántas veces se ejecutó.
#[derive(Debug, Clone, Default)]
pub struct CountingUpper {
    pub calls: Arc<AtomicUsize>,
}

impl CountingUpper {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Instructions for CountingUpper {
    fn run(&self, ctx: &ExecutionContext) -> StepRunResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let res: std::io::Result<()> = (|| {
            let text = fs::read_to_string(ctx.ingredient("text")?)?;
            fs::write(ctx.output(), text.to_uppercase())
        })();
        res.into()
    }

    fn definition(&self) -> Value {
        json!("counting-upper")
    }
}

/// Escribe un valor distinto en cada ejecución.
#[derive(Debug, Clone, Default)]
pub struct Stamp {
    pub counter: Arc<AtomicUsize>,
}

impl Instructions for Stamp {
    fn run(&self, ctx: &ExecutionContext) -> StepRunResult {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        fs::write(ctx.output(), n.to_string()).into()
    }

    fn definition(&self) -> Value {
        json!("stamp")
    }
}

pub fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

pub fn read_json(path: impl AsRef<Path>) -> Value {
    serde_json::from_str(&read(path)).unwrap()
}
