//! Entity id translation and packet field rewriting

pub mod rewriter;
pub mod strategy;
pub mod translator;

pub use rewriter::{PacketRewriter, RewriteOutcome};
pub use strategy::{FieldKind, FieldSchema, IdEncoding, RewriteStrategy, StrategyTable, Tail};
pub use translator::EntityTranslator;
