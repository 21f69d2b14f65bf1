//! Static sets of legacy block ids that need more than a plain lookup.
//!
//! Both sets only span ids 0..=255. Ids that use the `Add` nibble are
//! never classified.

/// 256-bit set over legacy block ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyIdSet([u64; 4]);

impl LegacyIdSet {
    pub const fn from_ids(ids: &[u8]) -> Self {
        let mut words = [0u64; 4];
        let mut i = 0;
        while i < ids.len() {
            let id = ids[i] as usize;
            words[id >> 6] |= 1 << (id & 63);
            i += 1;
        }
        LegacyIdSet(words)
    }

    pub const fn contains(&self, id: u16) -> bool {
        if id >= 256 {
            return false;
        }
        let id = id as usize;
        self.0[id >> 6] & (1 << (id & 63)) != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        (0u16..256).filter(move |&id| self.contains(id))
    }
}

/// Blocks whose state is patched after every section is decoded, using
/// neighbouring cells or the block entity at the same position.
pub const NEEDS_FIX: LegacyIdSet = LegacyIdSet::from_ids(&[
    2, 3, 110, // grass, podzol, mycelium
    140, // flower pot
    144, // skull
    25,  // note block
    86,  // pumpkin
    26,  // bed
    176, 177, // banners
    175, // tall plants
    64, 71, 193, 194, 195, 196, 197, // doors
]);

/// Blocks whose shape depends on neighbours that may sit in another chunk.
pub const VIRTUAL: LegacyIdSet = LegacyIdSet::from_ids(&[
    54, 146, // chests
    25, 26, // note block, bed
    51, // fire
    53, 67, 108, 109, 114, 128, 134, 135, 136, 156, 163, 164, 180, 203, // stairs
    55, // redstone wire
    85, 113, 188, 189, 190, 191, 192, // fences
    93, 94, // repeaters
    101, 102, 160, // bars and panes
    106, // vine
    107, 183, 184, 185, 186, 187, // fence gates
    132, // tripwire
    139, // cobblestone wall
    199, // chorus plant
]);
