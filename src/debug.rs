//! Observers for entity bookkeeping and id rewrites.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, trace};

use crate::codec::EntityId;
use crate::protocol::PacketId;

/// Receives a record of every spawn, despawn and effective id rewrite.
///
/// Implementations must not fail or block for long; rewriting never looks at
/// what they do.
pub trait RewriteObserver: Send + Sync {
    fn record_spawn(&self, source: &str, backend_id: EntityId, client_id: EntityId);

    fn record_rewrite(&self, from: &str, to: &str, packet: PacketId, original: EntityId, rewritten: EntityId);

    fn record_despawn(&self, source: &str, entity_id: EntityId);
}

/// Emits every record as a tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RewriteObserver for TracingObserver {
    fn record_spawn(&self, source: &str, backend_id: EntityId, client_id: EntityId) {
        debug!(source, backend_id, client_id, "entity registered");
    }

    fn record_rewrite(&self, from: &str, to: &str, packet: PacketId, original: EntityId, rewritten: EntityId) {
        trace!(from, to, packet = ?packet, original, rewritten, "entity id rewritten");
    }

    fn record_despawn(&self, source: &str, entity_id: EntityId) {
        debug!(source, entity_id, "entity removed");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugRecord {
    Spawn {
        source: String,
        backend_id: EntityId,
        client_id: EntityId,
    },
    Rewrite {
        from: String,
        to: String,
        packet: PacketId,
        original: EntityId,
        rewritten: EntityId,
    },
    Despawn {
        source: String,
        entity_id: EntityId,
    },
}

/// Keeps the most recent records in memory and forwards them to tracing
#[derive(Debug)]
pub struct RewriteDebugger {
    capacity: usize,
    records: Mutex<VecDeque<DebugRecord>>,
}

impl RewriteDebugger {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Copy of the buffered records, oldest first
    pub fn records(&self) -> Vec<DebugRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn drain(&self) -> Vec<DebugRecord> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of buffered rewrite records
    pub fn rewrite_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|r| matches!(r, DebugRecord::Rewrite { .. }))
            .count()
    }

    fn push(&self, record: DebugRecord) {
        if self.capacity == 0 {
            return;
        }
        let mut records = self.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<DebugRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RewriteDebugger {
    fn default() -> Self {
        Self::new(256)
    }
}

impl RewriteObserver for RewriteDebugger {
    fn record_spawn(&self, source: &str, backend_id: EntityId, client_id: EntityId) {
        TracingObserver.record_spawn(source, backend_id, client_id);
        self.push(DebugRecord::Spawn {
            source: source.to_owned(),
            backend_id,
            client_id,
        });
    }

    fn record_rewrite(&self, from: &str, to: &str, packet: PacketId, original: EntityId, rewritten: EntityId) {
        TracingObserver.record_rewrite(from, to, packet, original, rewritten);
        self.push(DebugRecord::Rewrite {
            from: from.to_owned(),
            to: to.to_owned(),
            packet,
            original,
            rewritten,
        });
    }

    fn record_despawn(&self, source: &str, entity_id: EntityId) {
        TracingObserver.record_despawn(source, entity_id);
        self.push(DebugRecord::Despawn {
            source: source.to_owned(),
            entity_id,
        });
    }
}
