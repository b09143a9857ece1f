use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use bytes::Bytes;
use tracing::{info, warn};

use crate::codec::EntityId;
use crate::config::SessionConfig;
use crate::debug::RewriteDebugger;
use crate::error::Result;
use crate::protocol::Direction;
use crate::rewrite::{EntityTranslator, PacketRewriter};
use crate::client::events::{BackendInfo, EventCollector, EventHandler, SessionEvent};

/// Entity id bookkeeping for one connected client.
///
/// Safe to share between the client reader, the backend reader and the
/// spawn/despawn path. Each connection's packets must still be fed in arrival
/// order so a spawn is registered before anything refers to it.
pub struct ProxySession {
    config: SessionConfig,
    rewriter: PacketRewriter,
    debugger: Arc<RewriteDebugger>,
    backend: RwLock<BackendInfo>,
    events: Mutex<EventCollector>,
}

impl ProxySession {
    /// Start a session on its first backend.
    ///
    /// `own_client_id` is what the client will call its own entity for the
    /// whole session; `own_backend_id` is that entity's id on `backend`.
    pub fn new(
        config: SessionConfig,
        backend: BackendInfo,
        own_client_id: EntityId,
        own_backend_id: EntityId,
    ) -> Result<Self> {
        config.validate()?;

        let debugger = Arc::new(RewriteDebugger::new(config.history_capacity));
        let translator = EntityTranslator::new(own_client_id, backend.name.clone(), own_backend_id)
            .with_observer(debugger.clone())
            .with_first_id(config.first_client_id)
            .with_client_label(config.client_label.clone());

        let events = EventCollector::new(config.history_capacity);
        info!(backend = %backend.name, own_client_id, own_backend_id, "session started");

        Ok(Self {
            config,
            rewriter: PacketRewriter::new(Arc::new(translator)),
            debugger,
            backend: RwLock::new(backend),
            events: Mutex::new(events),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn translator(&self) -> &EntityTranslator {
        self.rewriter.translator()
    }

    pub fn rewriter(&self) -> &PacketRewriter {
        &self.rewriter
    }

    pub fn debugger(&self) -> &RewriteDebugger {
        &self.debugger
    }

    /// Backend the client is currently attached to
    pub fn backend(&self) -> BackendInfo {
        self.backend.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Move the client to another backend.
    ///
    /// Returns the number of entity mappings dropped.
    pub fn switch_backend(&self, backend: BackendInfo, own_backend_id: EntityId) -> usize {
        let removed = self.translator().switch_backend(
            backend.name.clone(),
            own_backend_id,
            self.config.clear_on_switch,
        );
        *self.backend.write().unwrap_or_else(PoisonError::into_inner) = backend.clone();

        self.events().on_event(SessionEvent::PlayerSwitched {
            client_id: self.translator().own_client_id(),
            backend,
        });
        removed
    }

    /// Backend reported a new entity; returns the id the client will see
    pub fn entity_spawned(&self, backend_id: EntityId) -> EntityId {
        self.translator().register(backend_id)
    }

    /// Backend reported an entity gone; returns the client id it had
    pub fn entity_despawned(&self, backend_id: EntityId) -> Option<EntityId> {
        self.translator().unregister(backend_id)
    }

    /// Despawn reported with the client-facing id; returns the backend id
    pub fn client_entity_despawned(&self, client_id: EntityId) -> Option<EntityId> {
        self.translator().unregister_by_client_id(client_id)
    }

    /// Rewrite a server to client payload (without its packet tag).
    ///
    /// Never fails: a payload that does not decode is forwarded as is.
    pub fn rewrite_outbound(&self, tag: u8, payload: Bytes) -> Bytes {
        self.rewrite(Direction::Clientbound, tag, payload)
    }

    /// Rewrite a client to server payload (without its packet tag).
    ///
    /// Never fails: a payload that does not decode is forwarded as is.
    pub fn rewrite_inbound(&self, tag: u8, payload: Bytes) -> Bytes {
        self.rewrite(Direction::Serverbound, tag, payload)
    }

    fn rewrite(&self, direction: Direction, tag: u8, payload: Bytes) -> Bytes {
        match self.rewriter.rewrite(direction, tag, &payload, 0) {
            Ok(outcome) => outcome.into_payload(&payload),
            Err(err) => {
                warn!(%direction, tag, len = payload.len(), error = %err, "entity rewrite failed, forwarding unchanged");
                payload
            }
        }
    }

    /// Pending switch events, oldest first
    pub fn drain_events(&self) -> Vec<SessionEvent> {
        self.events().drain()
    }

    fn events(&self) -> MutexGuard<'_, EventCollector> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
