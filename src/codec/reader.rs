use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use super::types::{BlockPosition, ItemStack, Vector3};

/// Longest legal encoding of a 32-bit varint
pub const MAX_VARINT32_BYTES: usize = 5;
/// Longest legal encoding of a 64-bit varint
pub const MAX_VARINT64_BYTES: usize = 10;

/// Binary reader for game protocol payloads
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Reader over `data` with the cursor already at `pos`
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos: pos.min(data.len()) }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn remaining_slice(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes between `start` and the current cursor
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.data[start.min(self.pos)..self.pos]
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        if self.remaining() < 1 {
            return Err(Error::UnexpectedEof);
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    pub fn read_f32_le(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    /// Unsigned LEB128, at most 5 bytes
    pub fn read_var_u32(&mut self) -> Result<u32> {
        Ok(self.read_varint(MAX_VARINT32_BYTES, 32)? as u32)
    }

    /// Zigzag-encoded signed LEB128, at most 5 bytes
    pub fn read_var_i32(&mut self) -> Result<i32> {
        let raw = self.read_var_u32()?;
        Ok((raw >> 1) as i32 ^ -((raw & 1) as i32))
    }

    /// Unsigned LEB128, at most 10 bytes
    pub fn read_var_u64(&mut self) -> Result<u64> {
        self.read_varint(MAX_VARINT64_BYTES, 64)
    }

    /// Zigzag-encoded signed LEB128, at most 10 bytes
    pub fn read_var_i64(&mut self) -> Result<i64> {
        let raw = self.read_var_u64()?;
        Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
    }

    /// The last allowed byte may only carry the bits left over from `bits`
    fn read_varint(&mut self, max_bytes: usize, bits: u32) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..max_bytes {
            let byte = self.read_u8()?;
            if i == max_bytes - 1 && u32::from(byte) >> (bits - 7 * i as u32) != 0 {
                return Err(Error::VarIntTooLong { max_bytes });
            }
            value |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::VarIntTooLong { max_bytes })
    }

    /// Read a u16-length-prefixed byte blob
    pub fn read_short_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u16_le()? as usize;
        self.read_bytes(len)
    }

    pub fn read_vector3(&mut self) -> Result<Vector3> {
        Ok(Vector3 {
            x: self.read_f32_le()?,
            y: self.read_f32_le()?,
            z: self.read_f32_le()?,
        })
    }

    pub fn read_block_position(&mut self) -> Result<BlockPosition> {
        Ok(BlockPosition {
            x: self.read_var_i32()?,
            y: self.read_var_u32()?,
            z: self.read_var_i32()?,
        })
    }

    /// Read an item stack; id 0 is air and carries no further fields
    pub fn read_item_stack(&mut self) -> Result<ItemStack> {
        let id = self.read_var_i32()?;
        if id == 0 {
            return Ok(ItemStack::air());
        }
        let aux = self.read_var_i32()?;
        let nbt = self.read_short_bytes()?.to_vec();
        Ok(ItemStack { id, aux, nbt })
    }

    /// Read remaining bytes
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}
