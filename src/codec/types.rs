/// Entity identifier as carried on the wire.
///
/// Zigzag-encoded fields are reinterpreted bit-for-bit, so a signed id and its
/// unsigned counterpart compare equal.
pub type EntityId = u64;

/// Float position or motion vector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Block coordinates; y is never negative on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPosition {
    pub x: i32,
    pub y: u32,
    pub z: i32,
}

impl BlockPosition {
    pub fn new(x: i32, y: u32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Item stack as used inside inventory transactions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemStack {
    pub id: i32,
    pub aux: i32,
    /// Raw little-endian NBT, passed through untouched
    pub nbt: Vec<u8>,
}

impl ItemStack {
    pub fn air() -> Self {
        Self::default()
    }

    pub fn new(id: i32, aux: i32) -> Self {
        Self { id, aux, nbt: Vec::new() }
    }

    pub fn is_air(&self) -> bool {
        self.id == 0
    }
}
