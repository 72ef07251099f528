use std::fs::{self, File};
use std::io::{self, Write};

use recipe_core::step::BoxError;
use recipe_core::{ExecutionContext, Instructions, StepRunResult};
use serde_json::{json, Value};

/// Concatena los ingredientes indicados, en ese orden, separados por
/// `separator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concatenate {
    bindings: Vec<String>,
    separator: String,
}

impl Concatenate {
    pub fn new<I, S>(bindings: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { bindings: bindings.into_iter().map(Into::into).collect(),
               separator: String::new() }
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    fn concat(&self, ctx: &ExecutionContext) -> Result<(), BoxError> {
        let mut out = io::BufWriter::new(File::create(ctx.output())?);
        for (k, binding) in self.bindings.iter().enumerate() {
            if k > 0 {
                out.write_all(self.separator.as_bytes())?;
            }
            out.write_all(&fs::read(ctx.ingredient(binding)?)?)?;
        }
        out.flush()?;
        Ok(())
    }
}

impl Instructions for Concatenate {
    fn run(&self, ctx: &ExecutionContext) -> StepRunResult {
        self.concat(ctx).into()
    }

    fn definition(&self) -> Value {
        json!({ "concatenate": self.bindings, "separator": self.separator })
    }

    fn description(&self) -> Option<String> {
        Some(format!("Concatenate {}", self.bindings.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_in_declared_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "1").unwrap();
        fs::write(&b, "2").unwrap();
        let ctx = ExecutionContext { step: "cat".into(),
                                     ingredients: [("b".to_string(), b), ("a".to_string(), a)].into_iter().collect(),
                                     output: dir.path().join("out"),
                                     workspace: dir.path().to_path_buf() };
        assert!(Concatenate::new(["a", "b"]).separator("\n").run(&ctx).is_success());
        assert_eq!(fs::read_to_string(dir.path().join("out")).unwrap(), "1\n2");
    }
}
