//! Entity Rewrite
//!
//! Entity id translation for a game proxy that moves clients between
//! backend servers without reconnecting them. Each backend numbers its
//! entities independently; this crate keeps the client's view stable and
//! rewrites the id fields inside packets travelling either way.

pub mod client;
pub mod codec;
pub mod config;
pub mod debug;
pub mod error;
pub mod protocol;
pub mod rewrite;

pub use error::{Error, Result};
pub use client::{BackendInfo, EventCollector, ProxySession, SessionEvent};
pub use codec::{
    BinaryReader, BinaryWriter, EntityId,
    InventoryTransaction, TransactionType,
};
pub use config::SessionConfig;
pub use debug::{DebugRecord, RewriteDebugger, RewriteObserver, TracingObserver};
pub use protocol::{Direction, PacketId};
pub use rewrite::{
    EntityTranslator, PacketRewriter, RewriteOutcome,
    RewriteStrategy, StrategyTable,
};
