use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{RunEvent, RunEventKind};

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent;
    /// Lista eventos de una corrida (orden ascendente por seq).
    fn list(&self, run_id: Uuid) -> Vec<RunEvent>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<RunEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent {
        let events = self.inner.entry(run_id).or_default();
        let ev = RunEvent { seq: events.len() as u64,
                            run_id,
                            kind,
                            ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }
}
