use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::codec::EntityId;

/// Backend server the client is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    pub name: String,
    pub address: String,
}

impl BackendInfo {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Session events for other proxy subsystems
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The client's own entity now lives on another backend
    PlayerSwitched {
        client_id: EntityId,
        backend: BackendInfo,
    },
}

/// Event handler trait
pub trait EventHandler {
    fn on_event(&mut self, event: SessionEvent);
}

/// Event collector holding at most `capacity` undrained events; the oldest
/// is dropped first
#[derive(Debug)]
pub struct EventCollector {
    events: VecDeque<SessionEvent>,
    capacity: usize,
}

impl EventCollector {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn drain(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventCollector {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventHandler for EventCollector {
    fn on_event(&mut self, event: SessionEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}
