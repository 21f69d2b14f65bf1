//! One 16x16x16 section, decoded from the legacy `Blocks`/`Data`/`Add`
//! arrays into a palette and re-encoded as bit-packed indices.

use std::sync::Arc;

use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use rustc_hash::FxHashMap;

use crate::block_state::BlockStateRef;
use crate::classify::{NEEDS_FIX, VIRTUAL};
use crate::error::{Result, UpgradeError};
use crate::legacy_states::LegacyBlockStates;
use crate::nibble::NibbleLayer;
use crate::packed::{bits_for_palette, PackedBitStorage};
use crate::tag;
use crate::upgrade_data::SideMask;

pub const SECTION_VOLUME: usize = 4096;

#[derive(Debug, Clone)]
struct LegacyArrays {
    blocks: Vec<u8>,
    data: NibbleLayer,
    add: NibbleLayer,
}

impl LegacyArrays {
    fn from_nbt(section: &NbtCompound, blocks: &[i8]) -> Result<Self> {
        if blocks.len() != SECTION_VOLUME {
            return Err(UpgradeError::BlocksLength(blocks.len()));
        }
        let data = match tag::byte_array(section, "Data") {
            Some(bytes) => NibbleLayer::from_nbt_bytes(bytes)?,
            None => NibbleLayer::default(),
        };
        let add = match tag::byte_array(section, "Add") {
            Some(bytes) => NibbleLayer::from_nbt_bytes(bytes)?,
            None => NibbleLayer::default(),
        };
        Ok(LegacyArrays {
            blocks: blocks.iter().map(|&b| b as u8).collect(),
            data,
            add,
        })
    }

    /// `add << 12 | block << 4 | data` for section index `index`.
    fn legacy_code(&self, index: usize) -> u16 {
        (self.add.get_index(index) as u16) << 12
            | (self.blocks[index] as u16) << 4
            | self.data.get_index(index) as u16
    }
}

#[derive(Debug, Clone)]
pub struct PaletteSection {
    y: i32,
    nbt: NbtCompound,
    legacy: Option<LegacyArrays>,
    has_data: bool,
    upgraded: bool,
    air: BlockStateRef,
    /// Distinct states by pointer identity, in insertion order. The
    /// position of a state here is its palette id.
    states: Vec<BlockStateRef>,
    ids: FxHashMap<usize, u32>,
    /// What `write` emits; the filter marker is already replaced by air.
    palette: Vec<BlockStateRef>,
    buffer: Vec<u32>,
    to_fix: Vec<(u16, Vec<u16>)>,
    update: Vec<i32>,
}

impl PaletteSection {
    /// Reads a legacy section. Sections without a `Blocks` array carry no
    /// data and pass through `upgrade` and `write` untouched.
    pub fn from_nbt(nbt: NbtCompound, air: BlockStateRef) -> Result<Self> {
        let y = tag::int_or(&nbt, "Y", 0);
        let legacy = match tag::byte_array(&nbt, "Blocks") {
            Some(blocks) => Some(LegacyArrays::from_nbt(&nbt, blocks)?),
            None => None,
        };
        Ok(PaletteSection {
            y,
            has_data: legacy.is_some(),
            nbt,
            legacy,
            upgraded: false,
            air,
            states: Vec::new(),
            ids: FxHashMap::default(),
            palette: Vec::new(),
            buffer: vec![0; SECTION_VOLUME],
            to_fix: Vec::new(),
            update: Vec::new(),
        })
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn has_data(&self) -> bool {
        self.has_data
    }

    pub fn is_upgraded(&self) -> bool {
        self.upgraded
    }

    /// Decodes every cell, records the cells the fix pass and the world
    /// loader need, and returns `sides` with this section's border cells
    /// added.
    pub fn upgrade(&mut self, mut sides: SideMask, states: &dyn LegacyBlockStates) -> SideMask {
        let Some(legacy) = self.legacy.take() else {
            return sides;
        };

        let air = self.air.clone();
        self.set_block(0, air);

        for index in 0..SECTION_VOLUME {
            let x = index & 15;
            let z = (index >> 4) & 15;
            let code = legacy.legacy_code(index);
            let id = code >> 4;

            if NEEDS_FIX.contains(id) {
                self.add_fix(id, index as u16);
            }
            if VIRTUAL.contains(id) {
                let side = SideMask::for_edges(x == 0, x == 15, z == 0, z == 15);
                if side.is_empty() {
                    self.update.push(index as i32);
                } else {
                    sides |= side;
                }
            }

            self.set_block(index as i32, states.from_legacy_code(code));
        }

        self.upgraded = true;
        sides
    }

    fn add_fix(&mut self, id: u16, index: u16) {
        match self.to_fix.iter_mut().find(|(fix_id, _)| *fix_id == id) {
            Some((_, cells)) => cells.push(index),
            None => self.to_fix.push((id, vec![index])),
        }
    }

    /// Points cell `index` at `state`, adding `state` to the palette if
    /// this exact instance has not been seen. Out-of-range indices are
    /// ignored.
    pub fn set_block(&mut self, index: i32, state: BlockStateRef) {
        if !(0..SECTION_VOLUME as i32).contains(&index) {
            return;
        }
        let key = Arc::as_ptr(&state) as usize;
        let id = match self.ids.get(&key) {
            Some(&id) => id,
            None => {
                let id = self.states.len() as u32;
                self.palette.push(if state.is_filter_marker() {
                    self.air.clone()
                } else {
                    state.clone()
                });
                self.ids.insert(key, id);
                self.states.push(state);
                id
            }
        };
        self.buffer[index as usize] = id;
    }

    /// State of cell `index`, or air when the index is out of range or
    /// points past the palette.
    pub fn get_block(&self, index: i32) -> BlockStateRef {
        if !(0..SECTION_VOLUME as i32).contains(&index) {
            return self.air.clone();
        }
        self.states
            .get(self.buffer[index as usize] as usize)
            .cloned()
            .unwrap_or_else(|| self.air.clone())
    }

    /// Legacy ids that need the fix pass, each with its section-local cells
    /// in decode order.
    pub fn to_fix(&self) -> &[(u16, Vec<u16>)] {
        &self.to_fix
    }

    /// Cells of cross-boundary blocks away from the chunk border.
    pub fn update_indices(&self) -> &[i32] {
        &self.update
    }

    /// Palette as `write` will emit it.
    pub fn palette(&self) -> &[BlockStateRef] {
        &self.palette
    }

    pub fn bits(&self) -> u32 {
        bits_for_palette(self.states.len())
    }

    /// Replaces the legacy arrays with `Palette` and `BlockStates`.
    pub fn write(self) -> Result<NbtCompound> {
        let mut nbt = self.nbt;
        if !self.has_data {
            return Ok(nbt);
        }
        if !self.upgraded {
            return Err(UpgradeError::SectionNotUpgraded(self.y));
        }

        let palette: Vec<NbtTag> = self.palette.iter().map(|state| state.to_nbt()).collect();
        nbt.insert("Palette", NbtTag::List(NbtList::from(palette)));

        let mut storage = PackedBitStorage::new(bits_for_palette(self.states.len()), SECTION_VOLUME);
        for (index, &id) in self.buffer.iter().enumerate() {
            storage.set(index, id);
        }
        nbt.insert("BlockStates", NbtTag::LongArray(storage.raw()));

        let inner = nbt.inner_mut();
        inner.remove("Blocks");
        inner.remove("Data");
        inner.remove("Add");
        Ok(nbt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_state::{BlockState, FILTER_MARKER};
    use crate::legacy_states::LegacyStateTable;
    use crate::position::pack_local;

    fn table() -> LegacyStateTable {
        let mut table = LegacyStateTable::new();
        table.register_str(1 << 4, "minecraft:stone").unwrap();
        table.register_str(3 << 4, "minecraft:dirt").unwrap();
        table.register_str(85 << 4, "minecraft:oak_fence").unwrap();
        table
    }

    fn legacy_section(y: i8, fill: impl Fn(usize) -> (u8, u8)) -> NbtCompound {
        let mut blocks = vec![0i8; SECTION_VOLUME];
        let mut data = vec![0i8; SECTION_VOLUME / 2];
        for index in 0..SECTION_VOLUME {
            let (block, meta) = fill(index);
            blocks[index] = block as i8;
            data[index >> 1] |= ((meta & 15) << ((index & 1) * 4)) as i8;
        }
        let mut nbt = NbtCompound::new();
        nbt.insert("Y", NbtTag::Byte(y));
        nbt.insert("Blocks", NbtTag::ByteArray(blocks));
        nbt.insert("Data", NbtTag::ByteArray(data));
        nbt
    }

    fn upgraded(nbt: NbtCompound, table: &LegacyStateTable) -> (PaletteSection, SideMask) {
        let mut section = PaletteSection::from_nbt(nbt, table.air()).unwrap();
        let sides = section.upgrade(SideMask::NONE, table);
        (section, sides)
    }

    #[test]
    fn test_section_without_blocks_passes_through() {
        let table = table();
        let mut nbt = NbtCompound::new();
        nbt.insert("Y", NbtTag::Byte(3));
        nbt.insert("SkyLight", NbtTag::ByteArray(vec![0; 2048]));

        let mut section = PaletteSection::from_nbt(nbt.clone(), table.air()).unwrap();
        assert!(!section.has_data());
        assert_eq!(section.upgrade(SideMask::WEST, &table), SideMask::WEST);
        assert!(Arc::ptr_eq(&section.get_block(0), &table.air()));
        assert_eq!(section.write().unwrap(), nbt);
    }

    #[test]
    fn test_air_is_palette_id_zero() {
        let table = table();
        // first cell is stone, air only shows up at the end
        let (section, _) = upgraded(legacy_section(0, |i| if i < 4095 { (1, 0) } else { (0, 0) }), &table);

        assert_eq!(section.palette()[0].name, "minecraft:air");
        assert_eq!(section.palette()[1].name, "minecraft:stone");
        assert_eq!(section.palette().len(), 2);
        assert_eq!(section.bits(), 4);
    }

    #[test]
    fn test_decodes_data_and_add_nibbles() {
        let mut table = table();
        table.register_str(35 << 4 | 14, "minecraft:red_wool").unwrap();
        table.register_str(35 << 4, "minecraft:white_wool").unwrap();

        let mut nbt = legacy_section(0, |i| if i == 5 { (35, 14) } else { (35, 0) });
        let mut add = vec![0i8; 2048];
        add[6 >> 1] = 0x01; // cell 6 gets id 256 + 35
        nbt.insert("Add", NbtTag::ByteArray(add));

        let (section, _) = upgraded(nbt, &table);
        assert_eq!(section.get_block(5).name, "minecraft:red_wool");
        assert_eq!(section.get_block(4).name, "minecraft:white_wool");
        // add-extended codes are outside the table and resolve to air
        assert_eq!(section.get_block(6).name, "minecraft:air");
    }

    #[test]
    fn test_wrong_sized_arrays_fail() {
        let table = table();
        let mut nbt = legacy_section(0, |_| (1, 0));
        nbt.insert("Data", NbtTag::ByteArray(vec![0; 100]));
        assert!(matches!(
            PaletteSection::from_nbt(nbt, table.air()),
            Err(UpgradeError::NibbleLength(100))
        ));

        let mut nbt = NbtCompound::new();
        nbt.insert("Blocks", NbtTag::ByteArray(vec![0; 16]));
        assert!(matches!(
            PaletteSection::from_nbt(nbt, table.air()),
            Err(UpgradeError::BlocksLength(16))
        ));
    }

    #[test]
    fn test_virtual_blocks_split_into_sides_and_update() {
        let table = table();
        let interior = pack_local(5, 2, 7) as usize;
        let north_east = pack_local(15, 0, 0) as usize;
        let west = pack_local(0, 9, 8) as usize;
        let nbt = legacy_section(0, |i| {
            if i == interior || i == north_east || i == west {
                (85, 0)
            } else {
                (1, 0)
            }
        });

        let (section, sides) = upgraded(nbt, &table);
        assert_eq!(sides, SideMask::NORTH_EAST | SideMask::WEST);
        assert_eq!(section.update_indices(), &[interior as i32]);
    }

    #[test]
    fn test_fix_candidates_grouped_by_id() {
        let table = table();
        let nbt = legacy_section(0, |i| match i {
            10 | 300 => (2, 0),
            20 => (86, 0),
            _ => (1, 0),
        });

        let (section, _) = upgraded(nbt, &table);
        assert_eq!(section.to_fix(), &[(2, vec![10, 300]), (86, vec![20])]);
    }

    #[test]
    fn test_identity_dedup_keeps_equal_copies_apart() {
        let table = table();
        let (mut section, _) = upgraded(legacy_section(0, |_| (1, 0)), &table);

        let copy = Arc::new(BlockState::new("minecraft:stone"));
        section.set_block(100, copy.clone());
        section.set_block(101, copy);
        section.set_block(102, table.from_legacy_code(1 << 4));

        let names: Vec<&str> = section.palette().iter().map(|s| s.get_name()).collect();
        assert_eq!(names, vec!["minecraft:air", "minecraft:stone", "minecraft:stone"]);
    }

    #[test]
    fn test_filter_marker_written_as_air_with_own_id() {
        let mut table = table();
        table.register_str(95 << 4, FILTER_MARKER).unwrap();
        let (section, _) = upgraded(legacy_section(0, |i| if i == 0 { (95, 0) } else { (1, 0) }), &table);

        assert!(section.get_block(0).is_filter_marker());
        let names: Vec<&str> = section.palette().iter().map(|s| s.get_name()).collect();
        assert_eq!(names, vec!["minecraft:air", "minecraft:air", "minecraft:stone"]);
    }

    #[test]
    fn test_get_block_out_of_range_is_air() {
        let table = table();
        let (section, _) = upgraded(legacy_section(0, |_| (1, 0)), &table);
        assert_eq!(section.get_block(-1).name, "minecraft:air");
        assert_eq!(section.get_block(4096).name, "minecraft:air");
        assert_eq!(section.get_block(4095).name, "minecraft:stone");
    }

    #[test]
    fn test_write_before_upgrade_fails() {
        let table = table();
        let section = PaletteSection::from_nbt(legacy_section(2, |_| (1, 0)), table.air()).unwrap();
        assert!(matches!(section.write(), Err(UpgradeError::SectionNotUpgraded(2))));
    }

    #[test]
    fn test_write_replaces_legacy_arrays() {
        let table = table();
        let (section, _) = upgraded(legacy_section(4, |i| if i % 2 == 0 { (1, 0) } else { (3, 0) }), &table);
        let nbt = section.write().unwrap();

        assert!(!nbt.contains_key("Blocks"));
        assert!(!nbt.contains_key("Data"));
        assert!(!nbt.contains_key("Add"));
        assert_eq!(tag::int(&nbt, "Y"), Some(4));

        let palette = nbt.get::<_, &NbtList>("Palette").unwrap();
        assert_eq!(palette.len(), 3);
        let Some(NbtTag::LongArray(raw)) = nbt.inner().get("BlockStates") else {
            panic!("expected BlockStates long array");
        };
        assert_eq!(raw.len(), 4096 * 4 / 64);

        let storage = PackedBitStorage::from_raw(4, SECTION_VOLUME, raw);
        assert_eq!(storage.get(0), 1);
        assert_eq!(storage.get(1), 2);
    }
}
