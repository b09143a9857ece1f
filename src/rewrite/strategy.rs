//! Per-packet descriptions of where entity ids live in a payload.

use indexmap::IndexMap;

use crate::codec::{BinaryReader, BinaryWriter, EntityId};
use crate::error::Result;
use crate::protocol::{Direction, PacketId};

/// A field that precedes the entity id and is copied through untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Byte,
    VarU32,
    VarI32,
}

impl FieldKind {
    /// Advance past one field, validating its encoding
    pub fn skip(self, reader: &mut BinaryReader) -> Result<()> {
        match self {
            Self::Byte => reader.read_u8().map(drop),
            Self::VarU32 => reader.read_var_u32().map(drop),
            Self::VarI32 => reader.read_var_i32().map(drop),
        }
    }
}

/// Wire encoding of an entity id field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdEncoding {
    /// Unsigned LEB128
    VarU64,
    /// Zigzag LEB128
    VarI64,
    /// Fixed 8 bytes, little-endian
    U64Le,
}

impl IdEncoding {
    pub fn read(self, reader: &mut BinaryReader) -> Result<EntityId> {
        match self {
            Self::VarU64 => reader.read_var_u64(),
            Self::VarI64 => Ok(reader.read_var_i64()? as EntityId),
            Self::U64Le => reader.read_u64_le(),
        }
    }

    pub fn write(self, writer: &mut BinaryWriter, id: EntityId) {
        match self {
            Self::VarU64 => writer.write_var_u64(id),
            Self::VarI64 => writer.write_var_i64(id as i64),
            Self::U64Le => writer.write_u64_le(id),
        }
    }
}

/// What follows the entity id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    /// Remaining bytes are copied verbatim
    Copy,
    /// The payload ends at the id
    None,
}

/// Leading fields, one id, and what follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub leading: &'static [FieldKind],
    pub id: IdEncoding,
    pub tail: Tail,
    /// Id 0 means "no target" and is never translated
    pub zero_is_none: bool,
}

impl FieldSchema {
    pub const fn new(leading: &'static [FieldKind], id: IdEncoding, tail: Tail) -> Self {
        Self { leading, id, tail, zero_is_none: false }
    }

    pub const fn zero_is_none(mut self) -> Self {
        self.zero_is_none = true;
        self
    }
}

/// How a packet's entity ids get rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStrategy {
    /// One id described by a schema
    Field(FieldSchema),
    /// Item id then collector id, both var_u64, nothing after
    Pickup,
    /// Five var_u32 flag words then a little-endian u64 id, nothing after
    Settings,
    /// Inventory transaction decoded in full; only entity-targeted ones change
    Transaction,
}

const NONE: &[FieldKind] = &[];
const SIGNED_VARINT: RewriteStrategy =
    RewriteStrategy::Field(FieldSchema::new(NONE, IdEncoding::VarI64, Tail::Copy));
const UNSIGNED_VARINT: RewriteStrategy =
    RewriteStrategy::Field(FieldSchema::new(NONE, IdEncoding::VarU64, Tail::Copy));

/// Strategy lookup for both directions
#[derive(Debug, Clone)]
pub struct StrategyTable {
    clientbound: IndexMap<PacketId, RewriteStrategy>,
    serverbound: IndexMap<PacketId, RewriteStrategy>,
}

impl StrategyTable {
    /// Empty table: nothing gets rewritten
    pub fn empty() -> Self {
        Self {
            clientbound: IndexMap::new(),
            serverbound: IndexMap::new(),
        }
    }

    /// Every packet of the game protocol that carries an entity id
    pub fn standard() -> Self {
        let mut table = Self::empty();

        table.insert(Direction::Clientbound, PacketId::BossEvent, SIGNED_VARINT);
        for id in [
            PacketId::SetEntityMotion,
            PacketId::MobEquipment,
            PacketId::MobArmorEquipment,
            PacketId::MoveEntity,
            PacketId::MovePlayer,
            PacketId::EntityEvent,
            PacketId::SetEntityData,
            PacketId::UpdateAttributes,
            PacketId::MobEffect,
        ] {
            table.insert(Direction::Clientbound, id, UNSIGNED_VARINT);
        }
        table.insert(
            Direction::Clientbound,
            PacketId::Animate,
            RewriteStrategy::Field(FieldSchema::new(&[FieldKind::VarU32], IdEncoding::VarU64, Tail::Copy)),
        );
        table.insert(Direction::Clientbound, PacketId::TakeItemEntity, RewriteStrategy::Pickup);
        table.insert(Direction::Clientbound, PacketId::AdventureSettings, RewriteStrategy::Settings);

        table.insert(Direction::Serverbound, PacketId::BossEvent, SIGNED_VARINT);
        for id in [
            PacketId::MobEquipment,
            PacketId::MobArmorEquipment,
            PacketId::MovePlayer,
            PacketId::SetEntityData,
            PacketId::EntityEvent,
            PacketId::PlayerAction,
        ] {
            table.insert(Direction::Serverbound, id, UNSIGNED_VARINT);
        }
        table.insert(
            Direction::Serverbound,
            PacketId::Animate,
            RewriteStrategy::Field(FieldSchema::new(&[FieldKind::VarI32], IdEncoding::VarU64, Tail::None)),
        );
        table.insert(
            Direction::Serverbound,
            PacketId::Interact,
            RewriteStrategy::Field(
                FieldSchema::new(&[FieldKind::Byte], IdEncoding::VarU64, Tail::Copy).zero_is_none(),
            ),
        );
        table.insert(Direction::Serverbound, PacketId::InventoryTransaction, RewriteStrategy::Transaction);

        table
    }

    pub fn insert(&mut self, direction: Direction, id: PacketId, strategy: RewriteStrategy) -> Option<RewriteStrategy> {
        self.side_mut(direction).insert(id, strategy)
    }

    pub fn remove(&mut self, direction: Direction, id: PacketId) -> Option<RewriteStrategy> {
        self.side_mut(direction).shift_remove(&id)
    }

    pub fn get(&self, direction: Direction, id: PacketId) -> Option<&RewriteStrategy> {
        self.side(direction).get(&id)
    }

    /// Entries in insertion order
    pub fn iter(&self, direction: Direction) -> impl Iterator<Item = (&PacketId, &RewriteStrategy)> {
        self.side(direction).iter()
    }

    pub fn len(&self, direction: Direction) -> usize {
        self.side(direction).len()
    }

    fn side(&self, direction: Direction) -> &IndexMap<PacketId, RewriteStrategy> {
        match direction {
            Direction::Clientbound => &self.clientbound,
            Direction::Serverbound => &self.serverbound,
        }
    }

    fn side_mut(&mut self, direction: Direction) -> &mut IndexMap<PacketId, RewriteStrategy> {
        match direction {
            Direction::Clientbound => &mut self.clientbound,
            Direction::Serverbound => &mut self.serverbound,
        }
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_sizes() {
        let table = StrategyTable::standard();
        assert_eq!(table.len(Direction::Clientbound), 13);
        assert_eq!(table.len(Direction::Serverbound), 10);
    }

    #[test]
    fn test_interact_only_serverbound() {
        let table = StrategyTable::standard();
        assert!(table.get(Direction::Clientbound, PacketId::Interact).is_none());
        let Some(RewriteStrategy::Field(schema)) = table.get(Direction::Serverbound, PacketId::Interact) else {
            panic!("interact should use a field schema");
        };
        assert!(schema.zero_is_none);
        assert_eq!(schema.leading, &[FieldKind::Byte]);
    }

    #[test]
    fn test_animate_action_encoding_differs_by_direction() {
        let table = StrategyTable::standard();
        let clientbound = table.get(Direction::Clientbound, PacketId::Animate);
        let serverbound = table.get(Direction::Serverbound, PacketId::Animate);
        assert!(matches!(clientbound, Some(RewriteStrategy::Field(s)) if s.tail == Tail::Copy));
        assert!(matches!(serverbound, Some(RewriteStrategy::Field(s)) if s.tail == Tail::None));
    }

    #[test]
    fn test_signed_id_encoding_reinterprets_bits() {
        let mut writer = BinaryWriter::new();
        IdEncoding::VarI64.write(&mut writer, -5i64 as EntityId);
        let data = writer.into_vec();
        let id = IdEncoding::VarI64.read(&mut BinaryReader::new(&data)).unwrap();
        assert_eq!(id as i64, -5);
    }

    #[test]
    fn test_remove_entry() {
        let mut table = StrategyTable::standard();
        assert_eq!(table.remove(Direction::Serverbound, PacketId::BossEvent), Some(SIGNED_VARINT));
        assert!(table.get(Direction::Serverbound, PacketId::BossEvent).is_none());
    }
}
