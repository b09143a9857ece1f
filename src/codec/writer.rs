use bytes::{BufMut, Bytes, BytesMut};

use super::types::{BlockPosition, ItemStack, Vector3};

/// Binary writer for game protocol payloads
pub struct BinaryWriter {
    data: BytesMut,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self { data: BytesMut::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: BytesMut::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data.to_vec()
    }

    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.put_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.put_u8(v);
    }

    pub fn write_u16_le(&mut self, v: u16) {
        self.data.put_u16_le(v);
    }

    pub fn write_u64_le(&mut self, v: u64) {
        self.data.put_u64_le(v);
    }

    pub fn write_f32_le(&mut self, v: f32) {
        self.data.put_f32_le(v);
    }

    /// Unsigned LEB128
    pub fn write_var_u32(&mut self, v: u32) {
        self.write_var_u64(u64::from(v));
    }

    /// Zigzag-encoded signed LEB128
    pub fn write_var_i32(&mut self, v: i32) {
        self.write_var_u32(((v << 1) ^ (v >> 31)) as u32);
    }

    /// Unsigned LEB128
    pub fn write_var_u64(&mut self, mut v: u64) {
        while v >= 0x80 {
            self.write_u8((v as u8 & 0x7F) | 0x80);
            v >>= 7;
        }
        self.write_u8(v as u8);
    }

    /// Zigzag-encoded signed LEB128
    pub fn write_var_i64(&mut self, v: i64) {
        self.write_var_u64(((v << 1) ^ (v >> 63)) as u64);
    }

    /// Write a u16-length-prefixed byte blob
    pub fn write_short_bytes(&mut self, bytes: &[u8]) {
        self.write_u16_le(bytes.len() as u16);
        self.write_bytes(bytes);
    }

    pub fn write_vector3(&mut self, v: Vector3) {
        self.write_f32_le(v.x);
        self.write_f32_le(v.y);
        self.write_f32_le(v.z);
    }

    pub fn write_block_position(&mut self, pos: BlockPosition) {
        self.write_var_i32(pos.x);
        self.write_var_u32(pos.y);
        self.write_var_i32(pos.z);
    }

    pub fn write_item_stack(&mut self, item: &ItemStack) {
        self.write_var_i32(item.id);
        if item.is_air() {
            return;
        }
        self.write_var_i32(item.aux);
        self.write_short_bytes(&item.nbt);
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BinaryWriter> for Bytes {
    fn from(writer: BinaryWriter) -> Self {
        writer.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::reader::BinaryReader;

    #[test]
    fn test_var_u64_encoding() {
        let mut writer = BinaryWriter::new();
        writer.write_var_u64(7);
        writer.write_var_u64(300);
        assert_eq!(writer.as_slice(), &[0x07, 0xAC, 0x02]);
    }

    #[test]
    fn test_var_u64_max_is_ten_bytes() {
        let mut writer = BinaryWriter::new();
        writer.write_var_u64(u64::MAX);
        assert_eq!(writer.len(), 10);

        let data = writer.into_vec();
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_var_u64().unwrap(), u64::MAX);
    }

    #[test]
    fn test_zigzag_extremes() {
        let mut writer = BinaryWriter::new();
        writer.write_var_i64(i64::MIN);
        writer.write_var_i64(i64::MAX);
        writer.write_var_i32(-1);

        let data = writer.into_vec();
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_var_i64().unwrap(), i64::MIN);
        assert_eq!(reader.read_var_i64().unwrap(), i64::MAX);
        assert_eq!(reader.read_var_i32().unwrap(), -1);
    }

    #[test]
    fn test_item_stack_air_is_single_byte() {
        let mut writer = BinaryWriter::new();
        writer.write_item_stack(&ItemStack::air());
        assert_eq!(writer.as_slice(), &[0x00]);
    }
}
