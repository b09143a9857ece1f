//! Inventory transaction payload
//!
//! # Layout
//!
//! ```text
//! transaction type      var_u32   (0..=4, see TransactionType)
//! action count          var_u32
//! actions[count]:
//!   source type         var_u32
//!   window id           var_i32   (container and crafting sources only)
//!   source flags        var_u32   (world source only)
//!   slot                var_u32
//!   old item            ItemStack
//!   new item            ItemStack
//! type payload:
//!   UseItem             action var_u32, block BlockPosition, face var_i32,
//!                       hotbar slot var_i32, item, player pos Vector3, click pos Vector3
//!   UseItemOnEntity     entity id var_u64, action var_u32, hotbar slot var_i32,
//!                       item, player pos Vector3, click pos Vector3
//!   ReleaseItem         action var_u32, hotbar slot var_i32, item, head pos Vector3
//!   Normal / Mismatch   (nothing)
//! ```
//!
//! Only `UseItemOnEntity` references an entity; the rewriter touches nothing
//! else in here.

use crate::codec::{BinaryReader, BinaryWriter, BlockPosition, EntityId, ItemStack, Vector3};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TransactionType {
    Normal = 0,
    Mismatch = 1,
    UseItem = 2,
    UseItemOnEntity = 3,
    ReleaseItem = 4,
}

impl TransactionType {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Normal),
            1 => Some(Self::Mismatch),
            2 => Some(Self::UseItem),
            3 => Some(Self::UseItemOnEntity),
            4 => Some(Self::ReleaseItem),
            _ => None,
        }
    }
}

/// Where an inventory action takes or puts its items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventorySource {
    Container { window_id: i32 },
    Global,
    World { flags: u32 },
    Creative,
    Crafting { window_id: i32 },
}

impl InventorySource {
    const CONTAINER: u32 = 0;
    const GLOBAL: u32 = 1;
    const WORLD: u32 = 2;
    const CREATIVE: u32 = 3;
    const CRAFTING: u32 = 99999;

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let source_type = reader.read_var_u32()?;
        match source_type {
            Self::CONTAINER => Ok(Self::Container { window_id: reader.read_var_i32()? }),
            Self::GLOBAL => Ok(Self::Global),
            Self::WORLD => Ok(Self::World { flags: reader.read_var_u32()? }),
            Self::CREATIVE => Ok(Self::Creative),
            Self::CRAFTING => Ok(Self::Crafting { window_id: reader.read_var_i32()? }),
            other => Err(Error::InvalidPacket(format!("unknown inventory source type: {other}"))),
        }
    }

    fn write(&self, writer: &mut BinaryWriter) {
        match *self {
            Self::Container { window_id } => {
                writer.write_var_u32(Self::CONTAINER);
                writer.write_var_i32(window_id);
            }
            Self::Global => writer.write_var_u32(Self::GLOBAL),
            Self::World { flags } => {
                writer.write_var_u32(Self::WORLD);
                writer.write_var_u32(flags);
            }
            Self::Creative => writer.write_var_u32(Self::CREATIVE),
            Self::Crafting { window_id } => {
                writer.write_var_u32(Self::CRAFTING);
                writer.write_var_i32(window_id);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryAction {
    pub source: InventorySource,
    pub slot: u32,
    pub old_item: ItemStack,
    pub new_item: ItemStack,
}

impl InventoryAction {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            source: InventorySource::read(reader)?,
            slot: reader.read_var_u32()?,
            old_item: reader.read_item_stack()?,
            new_item: reader.read_item_stack()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        self.source.write(writer);
        writer.write_var_u32(self.slot);
        writer.write_item_stack(&self.old_item);
        writer.write_item_stack(&self.new_item);
    }
}

/// Type-specific part of a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionData {
    Normal,
    Mismatch,
    UseItem {
        action_type: u32,
        block_position: BlockPosition,
        face: i32,
        hotbar_slot: i32,
        item: ItemStack,
        player_position: Vector3,
        click_position: Vector3,
    },
    UseItemOnEntity {
        entity_id: EntityId,
        action_type: u32,
        hotbar_slot: i32,
        item: ItemStack,
        player_position: Vector3,
        click_position: Vector3,
    },
    ReleaseItem {
        action_type: u32,
        hotbar_slot: i32,
        item: ItemStack,
        head_position: Vector3,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryTransaction {
    pub actions: Vec<InventoryAction>,
    pub data: TransactionData,
}

impl InventoryTransaction {
    pub fn transaction_type(&self) -> TransactionType {
        match self.data {
            TransactionData::Normal => TransactionType::Normal,
            TransactionData::Mismatch => TransactionType::Mismatch,
            TransactionData::UseItem { .. } => TransactionType::UseItem,
            TransactionData::UseItemOnEntity { .. } => TransactionType::UseItemOnEntity,
            TransactionData::ReleaseItem { .. } => TransactionType::ReleaseItem,
        }
    }

    /// Target entity, present only for `UseItemOnEntity`
    pub fn entity_id(&self) -> Option<EntityId> {
        match self.data {
            TransactionData::UseItemOnEntity { entity_id, .. } => Some(entity_id),
            _ => None,
        }
    }

    /// Replace the target entity. Returns false for transactions without one.
    pub fn set_entity_id(&mut self, id: EntityId) -> bool {
        match &mut self.data {
            TransactionData::UseItemOnEntity { entity_id, .. } => {
                *entity_id = id;
                true
            }
            _ => false,
        }
    }

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let raw_type = reader.read_var_u32()?;
        let transaction_type = TransactionType::from_u32(raw_type)
            .ok_or(Error::InvalidTransactionType(raw_type))?;

        let count = reader.read_var_u32()? as usize;
        // Every action needs at least four bytes, so cap before allocating
        if count > reader.remaining() / 4 {
            return Err(Error::InvalidPacket(format!(
                "inventory action count {count} exceeds payload ({} bytes left)",
                reader.remaining()
            )));
        }
        let mut actions = Vec::with_capacity(count);
        for _ in 0..count {
            actions.push(InventoryAction::read(reader)?);
        }

        let data = match transaction_type {
            TransactionType::Normal => TransactionData::Normal,
            TransactionType::Mismatch => TransactionData::Mismatch,
            TransactionType::UseItem => TransactionData::UseItem {
                action_type: reader.read_var_u32()?,
                block_position: reader.read_block_position()?,
                face: reader.read_var_i32()?,
                hotbar_slot: reader.read_var_i32()?,
                item: reader.read_item_stack()?,
                player_position: reader.read_vector3()?,
                click_position: reader.read_vector3()?,
            },
            TransactionType::UseItemOnEntity => TransactionData::UseItemOnEntity {
                entity_id: reader.read_var_u64()?,
                action_type: reader.read_var_u32()?,
                hotbar_slot: reader.read_var_i32()?,
                item: reader.read_item_stack()?,
                player_position: reader.read_vector3()?,
                click_position: reader.read_vector3()?,
            },
            TransactionType::ReleaseItem => TransactionData::ReleaseItem {
                action_type: reader.read_var_u32()?,
                hotbar_slot: reader.read_var_i32()?,
                item: reader.read_item_stack()?,
                head_position: reader.read_vector3()?,
            },
        };

        Ok(Self { actions, data })
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        writer.write_var_u32(self.transaction_type() as u32);
        writer.write_var_u32(self.actions.len() as u32);
        for action in &self.actions {
            action.write(writer);
        }

        match &self.data {
            TransactionData::Normal | TransactionData::Mismatch => {}
            TransactionData::UseItem {
                action_type,
                block_position,
                face,
                hotbar_slot,
                item,
                player_position,
                click_position,
            } => {
                writer.write_var_u32(*action_type);
                writer.write_block_position(*block_position);
                writer.write_var_i32(*face);
                writer.write_var_i32(*hotbar_slot);
                writer.write_item_stack(item);
                writer.write_vector3(*player_position);
                writer.write_vector3(*click_position);
            }
            TransactionData::UseItemOnEntity {
                entity_id,
                action_type,
                hotbar_slot,
                item,
                player_position,
                click_position,
            } => {
                writer.write_var_u64(*entity_id);
                writer.write_var_u32(*action_type);
                writer.write_var_i32(*hotbar_slot);
                writer.write_item_stack(item);
                writer.write_vector3(*player_position);
                writer.write_vector3(*click_position);
            }
            TransactionData::ReleaseItem {
                action_type,
                hotbar_slot,
                item,
                head_position,
            } => {
                writer.write_var_u32(*action_type);
                writer.write_var_i32(*hotbar_slot);
                writer.write_item_stack(item);
                writer.write_vector3(*head_position);
            }
        }
    }
}
