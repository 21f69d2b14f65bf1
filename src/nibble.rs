use crate::error::{Result, UpgradeError};

pub const NIBBLE_LAYER_BYTES: usize = 2048;

/// 4096 four-bit values stored two per byte. Even indices live in the low
/// nibble, odd indices in the high nibble.
#[derive(Debug, Clone)]
pub struct NibbleLayer {
    data: Vec<u8>,
}

impl Default for NibbleLayer {
    fn default() -> Self {
        NibbleLayer {
            data: vec![0; NIBBLE_LAYER_BYTES],
        }
    }
}

impl NibbleLayer {
    pub fn new(data: Vec<u8>) -> Result<Self> {
        if data.len() != NIBBLE_LAYER_BYTES {
            return Err(UpgradeError::NibbleLength(data.len()));
        }
        Ok(NibbleLayer { data })
    }

    pub fn from_nbt_bytes(bytes: &[i8]) -> Result<Self> {
        Self::new(bytes.iter().map(|&b| b as u8).collect())
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        self.get_index(y << 8 | z << 4 | x)
    }

    pub fn get_index(&self, index: usize) -> u8 {
        let byte = self.data[index >> 1];
        (byte >> ((index & 1) * 4)) & 0x0F
    }
}
