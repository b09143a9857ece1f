//! Backend-local ↔ client-facing entity id table for one client session.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ahash::AHashMap;
use tracing::{debug, error, info, warn};

use crate::codec::EntityId;
use crate::debug::{RewriteObserver, TracingObserver};

struct IdTables {
    /// Label of the active backend, used in observer records
    source: String,
    own_backend_id: EntityId,
    next_id: EntityId,
    /// backend-local -> client-facing
    forward: AHashMap<EntityId, EntityId>,
    /// client-facing -> backend-local
    reverse: AHashMap<EntityId, EntityId>,
}

impl IdTables {
    fn remove_backend(&mut self, backend_id: EntityId) -> Option<EntityId> {
        let client_id = self.forward.remove(&backend_id)?;
        self.reverse.remove(&client_id);
        Some(client_id)
    }

    fn remove_client(&mut self, client_id: EntityId) -> Option<EntityId> {
        let backend_id = self.reverse.remove(&client_id)?;
        self.forward.remove(&backend_id);
        Some(backend_id)
    }
}

/// Translates entity ids between the active backend and the client.
///
/// The client's own entity never enters the tables: it is matched against
/// `own_backend_id` / `own_client_id` before any lookup. Lookups take a read
/// lock; registration, removal and backend switches take the write lock and
/// update both directions before releasing it.
pub struct EntityTranslator {
    own_client_id: EntityId,
    client_label: String,
    tables: RwLock<IdTables>,
    observer: Arc<dyn RewriteObserver>,
}

impl EntityTranslator {
    pub fn new(own_client_id: EntityId, source: impl Into<String>, own_backend_id: EntityId) -> Self {
        Self {
            own_client_id,
            client_label: "client".to_owned(),
            tables: RwLock::new(IdTables {
                source: source.into(),
                own_backend_id,
                next_id: 1,
                forward: AHashMap::new(),
                reverse: AHashMap::new(),
            }),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RewriteObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// First value handed out by `register`
    pub fn with_first_id(self, first_id: EntityId) -> Self {
        self.write().next_id = first_id;
        self
    }

    pub fn with_client_label(mut self, label: impl Into<String>) -> Self {
        self.client_label = label.into();
        self
    }

    pub fn own_client_id(&self) -> EntityId {
        self.own_client_id
    }

    pub fn own_backend_id(&self) -> EntityId {
        self.read().own_backend_id
    }

    /// Label of the active backend
    pub fn source(&self) -> String {
        self.read().source.clone()
    }

    pub fn client_label(&self) -> &str {
        &self.client_label
    }

    pub fn observer(&self) -> &Arc<dyn RewriteObserver> {
        &self.observer
    }

    /// Number of mapped entities, not counting the client's own
    pub fn len(&self) -> usize {
        self.read().forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(backend_id, client_id)` pairs sorted by backend id
    pub fn snapshot(&self) -> Vec<(EntityId, EntityId)> {
        let mut pairs: Vec<_> = self.read().forward.iter().map(|(&b, &c)| (b, c)).collect();
        pairs.sort_unstable();
        pairs
    }

    /// Allocate a client-facing id for a freshly spawned backend entity.
    ///
    /// # Panics
    ///
    /// When the 64-bit client id space is exhausted.
    pub fn register(&self, backend_id: EntityId) -> EntityId {
        let mut tables = self.write();
        if backend_id == tables.own_backend_id {
            debug!(backend_id, "spawn of own entity ignored");
            return self.own_client_id;
        }
        let stale = tables.remove_backend(backend_id);
        if let Some(stale) = stale {
            debug!(backend_id, stale, "backend id re-registered, dropping old mapping");
        }

        let mut client_id = Self::allocate(&mut tables);
        if client_id == self.own_client_id {
            client_id = Self::allocate(&mut tables);
        }

        tables.forward.insert(backend_id, client_id);
        tables.reverse.insert(client_id, backend_id);
        let source = tables.source.clone();
        drop(tables);

        if stale.is_some() {
            self.observer.record_despawn(&source, backend_id);
        }
        self.observer.record_spawn(&source, backend_id, client_id);
        client_id
    }

    fn allocate(tables: &mut IdTables) -> EntityId {
        let id = tables.next_id;
        tables.next_id = match id.checked_add(1) {
            Some(next) => next,
            None => panic!("client entity id space exhausted"),
        };
        id
    }

    /// Map a backend-local id to the id the client knows.
    ///
    /// Unknown ids pass through unchanged.
    pub fn translate_to_client(&self, backend_id: EntityId) -> EntityId {
        let tables = self.read();
        if backend_id == tables.own_backend_id {
            return self.own_client_id;
        }
        match tables.forward.get(&backend_id) {
            Some(&client_id) => client_id,
            None => {
                warn!(backend_id, source = %tables.source, "entity referenced before spawn");
                backend_id
            }
        }
    }

    /// Map a client-facing id to the active backend's id.
    ///
    /// Unknown ids pass through unchanged; every known mapping is logged to
    /// help track down the miss.
    pub fn translate_to_backend(&self, client_id: EntityId) -> EntityId {
        let tables = self.read();
        if client_id == self.own_client_id {
            return tables.own_backend_id;
        }
        match tables.reverse.get(&client_id) {
            Some(&backend_id) => backend_id,
            None => {
                error!(client_id, source = %tables.source, "no backend id for client entity");
                for (&known_client, &known_backend) in &tables.reverse {
                    info!(client_id = known_client, backend_id = known_backend, "known mapping");
                }
                client_id
            }
        }
    }

    /// Forget a backend entity. Returns the client id it was known by.
    pub fn unregister(&self, backend_id: EntityId) -> Option<EntityId> {
        let mut tables = self.write();
        let removed = tables.remove_backend(backend_id);
        let source = tables.source.clone();
        drop(tables);

        self.observer.record_despawn(&source, backend_id);
        removed
    }

    /// Forget an entity by its client-facing id. Returns its backend id.
    pub fn unregister_by_client_id(&self, client_id: EntityId) -> Option<EntityId> {
        let removed = self.write().remove_client(client_id);
        self.observer.record_despawn(&self.client_label, client_id);
        removed
    }

    /// Point the translator at a new backend.
    ///
    /// With `clear` every mapping is dropped and reported as despawned;
    /// otherwise only a mapping that collides with the new own id is dropped.
    /// Returns the number of mappings removed.
    pub fn switch_backend(&self, source: impl Into<String>, own_backend_id: EntityId, clear: bool) -> usize {
        let mut tables = self.write();
        let previous = std::mem::replace(&mut tables.source, source.into());

        let removed: Vec<EntityId> = if clear {
            tables.reverse.clear();
            tables.forward.drain().map(|(backend_id, _)| backend_id).collect()
        } else {
            tables.remove_backend(own_backend_id).map(|_| own_backend_id).into_iter().collect()
        };
        tables.own_backend_id = own_backend_id;
        let source = tables.source.clone();
        drop(tables);

        for backend_id in &removed {
            self.observer.record_despawn(&previous, *backend_id);
        }
        info!(from = %previous, to = %source, own_backend_id, removed = removed.len(), "switched backend");
        removed.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, IdTables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IdTables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}
