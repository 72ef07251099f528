//! Macro utilitaria para declarar instrucciones de steps sin boilerplate.
//!
//! Exportada en la raíz del crate:
//!   use recipe_core::recipe_step;
//!
//! El fingerprint de código de las instrucciones generadas se deriva del
//! texto del cuerpo (`stringify!`) más la representación `Debug` de los
//! campos, de modo que cambiar la lógica o un parámetro invalida la cache.

use serde_json::{json, Value};

#[doc(hidden)]
pub fn __definition(name: &str, body: &str, fields: String) -> Value {
    json!({ "step": name, "body": body, "fields": fields })
}

/// Declara un struct que implementa `Instructions`.
///
/// Formas soportadas:
/// - `recipe_step! { step Name { run(ctx) { ... } } }`
/// - `recipe_step! { step Name { description: "..", run(ctx) { ... } } }`
/// - `recipe_step! { step Name { fields { a: T }, run(this, ctx) { ... } } }`
/// - `recipe_step! { step Name { fields { a: T }, description: "..", run(this, ctx) { ... } } }`
///
/// El cuerpo puede usar `?` sobre cualquier error convertible a `BoxError`.
/// `this` y `ctx` son nombres elegidos por el usuario (no usar `self`).
#[macro_export]
macro_rules! recipe_step {
    // ---------------- con fields y descripción ----------------
    (
        step $name:ident {
            fields { $($fname:ident : $fty:ty),+ $(,)? },
            description: $desc:expr,
            run($self_ident:ident, $ctx_ident:ident) $body:block
        }
    ) => {
        #[derive(Clone, Debug)]
        pub struct $name { $(pub $fname: $fty),+ }
        impl $name { pub fn new($($fname : $fty),+) -> Self { Self { $($fname),+ } } }
        $crate::recipe_step!(@impl $name, Some(($desc).to_string()), $self_ident, $ctx_ident, $body);
    };

    // ---------------- con fields ----------------
    (
        step $name:ident {
            fields { $($fname:ident : $fty:ty),+ $(,)? },
            run($self_ident:ident, $ctx_ident:ident) $body:block
        }
    ) => {
        #[derive(Clone, Debug)]
        pub struct $name { $(pub $fname: $fty),+ }
        impl $name { pub fn new($($fname : $fty),+) -> Self { Self { $($fname),+ } } }
        $crate::recipe_step!(@impl $name, None, $self_ident, $ctx_ident, $body);
    };

    // ---------------- unit con descripción ----------------
    (
        step $name:ident {
            description: $desc:expr,
            run($ctx_ident:ident) $body:block
        }
    ) => {
        #[derive(Clone, Debug, Default)]
        pub struct $name;
        impl $name { pub fn new() -> Self { Self } }
        $crate::recipe_step!(@impl $name, Some(($desc).to_string()), _unit_self, $ctx_ident, $body);
    };

    // ---------------- unit ----------------
    (
        step $name:ident {
            run($ctx_ident:ident) $body:block
        }
    ) => {
        #[derive(Clone, Debug, Default)]
        pub struct $name;
        impl $name { pub fn new() -> Self { Self } }
        $crate::recipe_step!(@impl $name, None, _unit_self, $ctx_ident, $body);
    };

    (@impl $name:ident, $desc:expr, $self_ident:ident, $ctx_ident:ident, $body:block) => {
        impl $crate::step::Instructions for $name {
            fn run(&self, ctx: &$crate::model::ExecutionContext) -> $crate::step::StepRunResult {
                #[allow(unused_variables)]
                let $self_ident = self;
                #[allow(unused_variables)]
                let $ctx_ident = ctx;
                let res = (|| -> ::std::result::Result<(), $crate::step::BoxError> {
                    $body;
                    Ok(())
                })();
                res.into()
            }

            fn definition(&self) -> $crate::__serde_json::Value {
                $crate::step::macros::__definition(stringify!($name), stringify!($body), format!("{:?}", self))
            }

            fn description(&self) -> Option<String> {
                $desc
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::fs;

    use indexmap::IndexMap;

    use crate::model::ExecutionContext;
    use crate::step::Instructions;

    recipe_step! {
        step WriteHello {
            description: "writes hello",
            run(ctx) {
                fs::write(ctx.output(), "hello")?;
            }
        }
    }

    recipe_step! {
        step Repeat {
            fields { times: usize },
            run(this, ctx) {
                let text = fs::read_to_string(ctx.ingredient("text")?)?;
                fs::write(ctx.output(), text.repeat(this.times))?;
            }
        }
    }

    fn ctx(dir: &std::path::Path, ingredients: &[(&str, std::path::PathBuf)]) -> ExecutionContext {
        ExecutionContext { step: "t".into(),
                           ingredients: ingredients.iter().map(|(k, v)| (k.to_string(), v.clone())).collect::<IndexMap<_, _>>(),
                           output: dir.join("out.txt"),
                           workspace: dir.to_path_buf() }
    }

    #[test]
    fn unit_step_runs_and_describes_itself() {
        let dir = tempfile::tempdir().unwrap();
        let step = WriteHello::new();
        assert!(step.run(&ctx(dir.path(), &[])).is_success());
        assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "hello");
        assert_eq!(step.description().as_deref(), Some("writes hello"));
    }

    #[test]
    fn field_values_enter_the_code_fingerprint() {
        assert_eq!(Repeat::new(2).code_fingerprint(), Repeat::new(2).code_fingerprint());
        assert_ne!(Repeat::new(2).code_fingerprint(), Repeat::new(3).code_fingerprint());
        assert_ne!(Repeat::new(2).code_fingerprint(), WriteHello::new().code_fingerprint());
    }

    #[test]
    fn errors_inside_the_body_become_failures() {
        let dir = tempfile::tempdir().unwrap();
        let res = Repeat::new(2).run(&ctx(dir.path(), &[]));
        assert!(!res.is_success());

        let input = dir.path().join("in.txt");
        fs::write(&input, "ab").unwrap();
        assert!(Repeat::new(2).run(&ctx(dir.path(), &[("text", input)])).is_success());
        assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "abab");
    }
}
