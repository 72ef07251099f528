//! Planificador del modo pickup.
//!
//! Partiendo de cada producto se camina hacia atrás: un step cuyo sidecar
//! coincide con su fingerprint codified (y cuyo archivo verifica) queda
//! satisfecho y sus ancestros no se visitan. Los steps nunca visitados se
//! heredan desde el linaje almacenado de algún step satisfecho.
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use log::{debug, info};

use super::{CacheKey, CacheLayer, CacheLookup, CacheMode};
use crate::errors::Result;
use crate::lineage::LineageRecord;

/// Vista mínima de un step para planificar.
#[derive(Debug, Clone)]
pub struct PickupNode<'a> {
    pub name: &'a str,
    /// Índices de los steps de los que depende.
    pub deps: Vec<usize>,
    /// Ruta relativa si el step está retenido (única ubicación con sidecar).
    pub relative: Option<&'a Path>,
    pub mode: CacheMode,
    pub codified: &'a str,
    pub is_product: bool,
}

#[derive(Debug, Default)]
pub struct PickupPlan {
    /// Steps que deben pasar por el ciclo normal (cache por cadena o ejecución).
    pub needed: BTreeSet<usize>,
    /// Steps satisfechos por codified (siempre `CacheLookup::Hit`).
    pub satisfied: HashMap<usize, CacheLookup>,
    /// Steps reconstruidos desde el linaje de un step satisfecho.
    pub inherited: HashMap<usize, LineageRecord>,
}

impl PickupPlan {
    fn visit(&mut self, nodes: &[PickupNode<'_>], layer: &CacheLayer, start: usize) -> Result<()> {
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            if !self.needed.insert(i) {
                continue;
            }
            let node = &nodes[i];
            if let Some(rel) = node.relative {
                match layer.lookup(node.name, rel, node.mode, CacheKey::Codified(node.codified))? {
                    hit @ CacheLookup::Hit { .. } => {
                        debug!("step={} satisfied by pickup", node.name);
                        self.satisfied.insert(i, hit);
                        continue;
                    }
                    CacheLookup::Miss { reason } => debug!("step={} not picked up: {reason}", node.name),
                }
            }
            stack.extend(node.deps.iter().rev().copied());
        }
        Ok(())
    }

    fn cached_record(&self, codified: &str) -> Option<LineageRecord> {
        self.satisfied.values().find_map(|hit| match hit {
                                   CacheLookup::Hit { record, .. } => record.find_codified(codified).cloned(),
                                   CacheLookup::Miss { .. } => None,
                               })
    }
}

pub fn plan_pickup(nodes: &[PickupNode<'_>], layer: &CacheLayer) -> Result<PickupPlan> {
    let mut plan = PickupPlan::default();
    for (i, node) in nodes.iter().enumerate() {
        if node.is_product {
            plan.visit(nodes, layer, i)?;
        }
    }
    loop {
        plan.inherited.clear();
        let mut missing = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            if plan.needed.contains(&i) {
                continue;
            }
            match plan.cached_record(node.codified) {
                Some(rec) => {
                    plan.inherited.insert(i, rec);
                }
                None => missing.push(i),
            }
        }
        if missing.is_empty() {
            break;
        }
        for i in missing {
            debug!("step={} absent from cached lineage; scheduling it", nodes[i].name);
            plan.visit(nodes, layer, i)?;
        }
    }
    info!("pickup plan: {} needed, {} satisfied, {} inherited",
          plan.needed.len(),
          plan.satisfied.len(),
          plan.inherited.len());
    Ok(plan)
}
