pub mod packet;

pub use packet::{Direction, PacketId};
