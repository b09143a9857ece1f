pub mod reader;
pub mod writer;
pub mod types;
pub mod transaction;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use types::*;
pub use transaction::{
    InventoryTransaction, InventoryAction, InventorySource,
    TransactionData, TransactionType,
};
