//! Dependency Resolver: grafo de ingredientes -> orden lineal determinista.
//!
//! Sin efectos secundarios. Los empates del orden topológico se rompen por
//! orden de declaración, así dos corridas de la misma receta ejecutan los
//! steps en la misma secuencia.
use std::collections::{BTreeSet, HashMap};

use crate::errors::{RecipeError, Result};
use crate::model::Role;
use crate::step::Step;

/// Receta resuelta: orden de ejecución, dependencias y roles por índice de
/// declaración.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub order: Vec<usize>,
    /// Dependencias directas de cada step (índices), en orden de declaración
    /// de ingredientes y sin repetir.
    pub deps: Vec<Vec<usize>>,
    pub roles: Vec<Role>,
}

pub fn resolve(steps: &[Step]) -> Result<Resolution> {
    let index: HashMap<&str, usize> = steps.iter().enumerate().map(|(i, s)| (s.name(), i)).collect();

    let mut deps = Vec::with_capacity(steps.len());
    for step in steps {
        let mut own = Vec::new();
        for dep in step.dependencies() {
            match index.get(dep) {
                Some(&j) => own.push(j),
                None => {
                    return Err(RecipeError::UnknownIngredient { step: step.name().to_string(),
                                                                ingredient: dep.to_string() })
                }
            }
        }
        deps.push(own);
    }

    let order = topological_order(steps, &deps)?;
    let roles = assign_roles(steps, &deps);
    Ok(Resolution { order, deps, roles })
}

/// Kahn con cola ordenada por índice de declaración.
fn topological_order(steps: &[Step], deps: &[Vec<usize>]) -> Result<Vec<usize>> {
    let n = steps.len();
    let mut pending: Vec<usize> = deps.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, own) in deps.iter().enumerate() {
        for &j in own {
            dependents[j].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &d in &dependents[i] {
            pending[d] -= 1;
            if pending[d] == 0 {
                ready.insert(d);
            }
        }
    }

    if order.len() < n {
        let cycle = find_cycle(&pending, deps);
        return Err(RecipeError::CyclicDependency { cycle: cycle.into_iter().map(|i| steps[i].name().to_string()).collect() });
    }
    Ok(order)
}

/// Todo step que Kahn no pudo ordenar depende de al menos otro step no
/// ordenado; siguiendo esas aristas se llega necesariamente a un ciclo.
fn find_cycle(pending: &[usize], deps: &[Vec<usize>]) -> Vec<usize> {
    let stuck = |i: usize| pending[i] > 0;
    let Some(start) = (0..pending.len()).find(|&i| stuck(i)) else {
        return Vec::new();
    };
    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(&next) = deps[current].iter().find(|&&j| stuck(j)) else {
            return path;
        };
        if let Some(pos) = path.iter().position(|&p| p == next) {
            let mut cycle = path.split_off(pos);
            cycle.push(next);
            return cycle;
        }
        path.push(next);
        current = next;
    }
}

/// Rol derivado: sin ingredientes -> `source`; no es ingrediente de nadie ->
/// `product` (tiene prioridad); resto -> `intermediary`. Un rol explícito
/// siempre gana.
pub fn assign_roles(steps: &[Step], deps: &[Vec<usize>]) -> Vec<Role> {
    let mut consumed = vec![false; steps.len()];
    for own in deps {
        for &j in own {
            consumed[j] = true;
        }
    }
    steps.iter()
         .enumerate()
         .map(|(i, step)| {
             if let Some(role) = step.declared_role() {
                 role
             } else if !consumed[i] {
                 Role::Product
             } else if deps[i].is_empty() {
                 Role::Source
             } else {
                 Role::Intermediary
             }
         })
         .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::model::ExecutionContext;
    use crate::step::{Instructions, StepRunResult};

    #[derive(Debug)]
    struct Noop;

    impl Instructions for Noop {
        fn run(&self, _ctx: &ExecutionContext) -> StepRunResult {
            StepRunResult::Success
        }
        fn definition(&self) -> Value {
            json!("noop")
        }
    }

    fn step(name: &str, ingredients: &[&str]) -> Step {
        ingredients.iter()
                   .enumerate()
                   .fold(Step::new(name, Noop), |s, (k, dep)| s.ingredient(format!("in{k}"), *dep))
    }

    fn names(steps: &[Step], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| steps[i].name().to_string()).collect()
    }

    #[test]
    fn dependencies_come_first_and_ties_follow_declaration() {
        let steps = vec![step("report", &["clean", "lookup"]),
                         step("clean", &["raw"]),
                         step("lookup", &[]),
                         step("raw", &[])];
        let res = resolve(&steps).unwrap();
        assert_eq!(names(&steps, &res.order), vec!["lookup", "raw", "clean", "report"]);
        assert_eq!(res.deps[0], vec![1, 2]);
    }

    #[test]
    fn cycles_are_named() {
        let steps = vec![step("a", &["b"]), step("b", &["a"]), step("c", &[])];
        let err = resolve(&steps).unwrap_err();
        assert_eq!(err, RecipeError::CyclicDependency { cycle: vec!["a".into(), "b".into(), "a".into()] });
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let steps = vec![step("a", &["a"])];
        assert_eq!(resolve(&steps).unwrap_err(),
                   RecipeError::CyclicDependency { cycle: vec!["a".into(), "a".into()] });
    }

    #[test]
    fn unknown_ingredient_is_reported_before_cycles() {
        let steps = vec![step("a", &["b"]), step("b", &["a", "nonexistent"])];
        assert_eq!(resolve(&steps).unwrap_err(),
                   RecipeError::UnknownIngredient { step: "b".into(),
                                                    ingredient: "nonexistent".into() });
    }

    #[test]
    fn roles_are_derived_unless_explicit() {
        let steps = vec![step("src", &[]),
                         step("mid", &["src"]),
                         step("out", &["mid"]),
                         step("lonely", &[]),
                         step("forced", &["src"]).role(Role::Intermediary)];
        let res = resolve(&steps).unwrap();
        assert_eq!(res.roles,
                   vec![Role::Source, Role::Intermediary, Role::Product, Role::Product, Role::Intermediary]);
    }
}
