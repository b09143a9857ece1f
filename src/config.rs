use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::EntityId;
use crate::error::{Error, Result};

/// Per-session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the client side in rewrite records
    pub client_label: String,
    /// Drop every entity mapping when the client moves to another backend
    pub clear_on_switch: bool,
    /// First client-facing id handed out to spawned entities
    pub first_client_id: EntityId,
    /// Number of debug records kept in memory
    pub history_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_label: "client".to_owned(),
            clear_on_switch: true,
            first_client_id: 1,
            history_capacity: 256,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Id 0 means "no target" in interaction packets, so it is never handed out
    pub fn validate(&self) -> Result<()> {
        if self.first_client_id == 0 {
            return Err(Error::Config("first_client_id must be at least 1".into()));
        }
        if self.client_label.is_empty() {
            return Err(Error::Config("client_label must not be empty".into()));
        }
        Ok(())
    }
}
