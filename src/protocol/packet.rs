use std::fmt;

/// Game packet ids whose payload references entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketId {
    TakeItemEntity = 0x11,
    MoveEntity = 0x12,
    MovePlayer = 0x13,
    EntityEvent = 0x1b,
    MobEffect = 0x1c,
    UpdateAttributes = 0x1d,
    InventoryTransaction = 0x1e,
    MobEquipment = 0x1f,
    MobArmorEquipment = 0x20,
    Interact = 0x21,
    PlayerAction = 0x24,
    SetEntityData = 0x27,
    SetEntityMotion = 0x28,
    Animate = 0x2c,
    AdventureSettings = 0x37,
    BossEvent = 0x4a,
}

impl PacketId {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x11 => Some(Self::TakeItemEntity),
            0x12 => Some(Self::MoveEntity),
            0x13 => Some(Self::MovePlayer),
            0x1b => Some(Self::EntityEvent),
            0x1c => Some(Self::MobEffect),
            0x1d => Some(Self::UpdateAttributes),
            0x1e => Some(Self::InventoryTransaction),
            0x1f => Some(Self::MobEquipment),
            0x20 => Some(Self::MobArmorEquipment),
            0x21 => Some(Self::Interact),
            0x24 => Some(Self::PlayerAction),
            0x27 => Some(Self::SetEntityData),
            0x28 => Some(Self::SetEntityMotion),
            0x2c => Some(Self::Animate),
            0x37 => Some(Self::AdventureSettings),
            0x4a => Some(Self::BossEvent),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Which way a packet travels through the proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Backend server to client
    Clientbound,
    /// Client to backend server
    Serverbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clientbound => f.write_str("clientbound"),
            Self::Serverbound => f.write_str("serverbound"),
        }
    }
}
