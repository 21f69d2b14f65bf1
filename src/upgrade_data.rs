//! The `UpgradeData` record left behind for the world loader.
//!
//! `Sides` flags which chunk edges hold cells whose final state depends on
//! a neighbouring chunk; `Indices` lists, per section, the cells that only
//! depend on their own chunk and can be recomputed on load.

use std::collections::BTreeMap;
use std::fmt;

use quartz_nbt::{NbtCompound, NbtTag};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SideMask(u8);

impl SideMask {
    pub const NONE: SideMask = SideMask(0);
    pub const NORTH: SideMask = SideMask(1);
    pub const NORTH_EAST: SideMask = SideMask(2);
    pub const EAST: SideMask = SideMask(4);
    pub const SOUTH_EAST: SideMask = SideMask(8);
    pub const SOUTH: SideMask = SideMask(16);
    pub const SOUTH_WEST: SideMask = SideMask(32);
    pub const WEST: SideMask = SideMask(64);
    pub const NORTH_WEST: SideMask = SideMask(128);

    pub const fn from_bits(bits: u8) -> Self {
        SideMask(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: SideMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Side of a cell on the chunk border. Corners map to a single corner
    /// flag; north beats south, and both beat the east/west edges.
    pub fn for_edges(west: bool, east: bool, north: bool, south: bool) -> Self {
        if north {
            if east {
                SideMask::NORTH_EAST
            } else if west {
                SideMask::NORTH_WEST
            } else {
                SideMask::NORTH
            }
        } else if south {
            if west {
                SideMask::SOUTH_WEST
            } else if east {
                SideMask::SOUTH_EAST
            } else {
                SideMask::SOUTH
            }
        } else if east {
            SideMask::EAST
        } else if west {
            SideMask::WEST
        } else {
            SideMask::NONE
        }
    }
}

impl std::ops::BitOr for SideMask {
    type Output = SideMask;

    fn bitor(self, rhs: SideMask) -> SideMask {
        SideMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SideMask {
    fn bitor_assign(&mut self, rhs: SideMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for SideMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010b}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeData {
    pub sides: SideMask,
    /// Section Y to section-local cell indices.
    pub indices: BTreeMap<i32, Vec<i32>>,
}

impl UpgradeData {
    pub fn to_nbt(&self) -> NbtCompound {
        let mut indices = NbtCompound::new();
        for (y, cells) in &self.indices {
            indices.insert(y.to_string(), NbtTag::IntArray(cells.clone()));
        }

        let mut nbt = NbtCompound::new();
        nbt.insert("Sides", NbtTag::Byte(self.sides.bits() as i8));
        nbt.insert("Indices", NbtTag::Compound(indices));
        nbt
    }

    /// Reads an `UpgradeData` compound; malformed entries are skipped.
    pub fn from_nbt(nbt: &NbtCompound) -> Self {
        let sides = SideMask::from_bits(crate::tag::int_or(nbt, "Sides", 0) as u8);
        let mut indices = BTreeMap::new();
        if let Ok(compound) = nbt.get::<_, &NbtCompound>("Indices") {
            for (key, value) in compound.inner() {
                let (Ok(y), NbtTag::IntArray(cells)) = (key.parse::<i32>(), value) else {
                    continue;
                };
                indices.insert(y, cells.clone());
            }
        }
        UpgradeData { sides, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_edges_sets_at_most_one_bit() {
        for bits in 0u8..16 {
            let (west, east, north, south) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            let mask = SideMask::for_edges(west, east, north, south);
            assert!(mask.bits().count_ones() <= 1);
            assert_eq!(mask.is_empty(), !(west || east || north || south));
        }
    }

    #[test]
    fn test_corner_priority() {
        assert_eq!(SideMask::for_edges(false, true, true, false), SideMask::NORTH_EAST);
        assert_eq!(SideMask::for_edges(true, false, true, false), SideMask::NORTH_WEST);
        assert_eq!(SideMask::for_edges(true, false, false, true), SideMask::SOUTH_WEST);
        assert_eq!(SideMask::for_edges(false, true, false, true), SideMask::SOUTH_EAST);
        // Impossible on a real chunk, but north still wins.
        assert_eq!(SideMask::for_edges(true, true, true, true), SideMask::NORTH_EAST);
        assert_eq!(SideMask::for_edges(false, false, true, true), SideMask::NORTH);
        assert_eq!(SideMask::for_edges(true, true, false, false), SideMask::EAST);
        assert_eq!(SideMask::for_edges(true, false, false, false), SideMask::WEST);
    }

    #[test]
    fn test_nbt_roundtrip() {
        let mut data = UpgradeData {
            sides: SideMask::NORTH | SideMask::SOUTH_WEST,
            indices: BTreeMap::new(),
        };
        data.indices.insert(0, vec![17, 300]);
        data.indices.insert(4, vec![]);

        let nbt = data.to_nbt();
        assert_eq!(nbt.get::<_, i8>("Sides").unwrap(), 33);
        assert_eq!(UpgradeData::from_nbt(&nbt), data);
    }

    #[test]
    fn test_high_bit_survives_byte_cast() {
        let data = UpgradeData {
            sides: SideMask::NORTH_WEST,
            indices: BTreeMap::new(),
        };
        let back = UpgradeData::from_nbt(&data.to_nbt());
        assert!(back.sides.contains(SideMask::NORTH_WEST));
    }
}
