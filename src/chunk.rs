//! Converts a whole legacy chunk.
//!
//! The conversion runs in two phases, each with its own type:
//! [`ChunkUpgrade::decode`] turns every section into a palette, then
//! [`DecodedChunk::apply_fixes`] patches the blocks that depend on their
//! neighbours or block entities. Fixes read across section borders, so
//! they can only start once the whole chunk is decoded.

use log::{debug, warn};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};

use crate::block_entities::BlockEntityTable;
use crate::block_state::BlockStateRef;
use crate::error::{Result, UpgradeError};
use crate::fixes::{run_fixes, FixContext, FixTables};
use crate::legacy_states::LegacyBlockStates;
use crate::section::PaletteSection;
use crate::settings::UpgradeSettings;
use crate::tag;
use crate::upgrade_data::{SideMask, UpgradeData};

pub const SECTION_COUNT: usize = 16;

/// Something odd about the input that did not stop the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkWarning {
    /// Two block entities claimed the same cell; the later one was kept.
    /// Coordinates are chunk-local.
    DuplicateBlockEntity { x: i32, y: i32, z: i32 },
}

/// State shared by both phases of a chunk conversion.
#[derive(Debug)]
pub struct ChunkUpgrade {
    level: NbtCompound,
    /// Block coordinates of the chunk's north-west corner.
    x: i32,
    z: i32,
    sections: Vec<Option<PaletteSection>>,
    block_entities: BlockEntityTable,
    sides: SideMask,
    alpha_format: bool,
    air: BlockStateRef,
    warnings: Vec<ChunkWarning>,
}

/// Every section decoded; contextual fixes not yet applied.
#[derive(Debug)]
pub struct DecodedChunk {
    chunk: ChunkUpgrade,
}

/// Fully converted, ready to be written.
#[derive(Debug)]
pub struct FixedChunk {
    chunk: ChunkUpgrade,
}

impl ChunkUpgrade {
    /// Reads the `Level` compound of a legacy chunk and decodes all of its
    /// sections.
    pub fn decode(
        mut level: NbtCompound,
        states: &dyn LegacyBlockStates,
        settings: &UpgradeSettings,
    ) -> Result<DecodedChunk> {
        let x = tag::int_or(&level, "xPos", 0) << 4;
        let z = tag::int_or(&level, "zPos", 0) << 4;

        let mut warnings = Vec::new();
        let mut block_entities = BlockEntityTable::new();
        for record in take_compounds(&mut level, "TileEntities") {
            let pos = BlockEntityTable::local_key(&record, x, z);
            if block_entities.insert(pos, record).is_some() {
                let (local_x, local_y, local_z) = (pos & 15, pos >> 8, (pos >> 4) & 15);
                if settings.warn_on_duplicate_block_entities {
                    warn!(
                        "In chunk {}x{} found a duplicate block entity at [{}, {}, {}]",
                        x, z, local_x, local_y, local_z
                    );
                }
                warnings.push(ChunkWarning::DuplicateBlockEntity {
                    x: local_x,
                    y: local_y,
                    z: local_z,
                });
            }
        }

        let alpha_format = settings.alpha_format(tag::boolean(&level, "convertedFromAlphaFormat"));

        let air = states.air();
        let mut sections: Vec<Option<PaletteSection>> = (0..SECTION_COUNT).map(|_| None).collect();
        let mut sides = SideMask::NONE;
        for nbt in take_compounds(&mut level, "Sections") {
            let mut section = PaletteSection::from_nbt(nbt, air.clone())?;
            let y = section.y();
            if !(0..SECTION_COUNT as i32).contains(&y) {
                return Err(UpgradeError::SectionOutOfRange(y));
            }
            sides = section.upgrade(sides, states);
            if sections[y as usize].replace(section).is_some() {
                debug!("Chunk {}x{} repeats section {}, keeping the last one", x, z, y);
            }
        }

        Ok(DecodedChunk {
            chunk: ChunkUpgrade {
                level,
                x,
                z,
                sections,
                block_entities,
                sides,
                alpha_format,
                air,
                warnings,
            },
        })
    }

    /// Block coordinates of the chunk's north-west corner.
    pub fn origin(&self) -> (i32, i32) {
        (self.x, self.z)
    }

    pub fn sides(&self) -> SideMask {
        self.sides
    }

    pub fn alpha_format(&self) -> bool {
        self.alpha_format
    }

    pub fn warnings(&self) -> &[ChunkWarning] {
        &self.warnings
    }

    pub fn block_entities(&self) -> &BlockEntityTable {
        &self.block_entities
    }

    pub fn section(&self, y: i32) -> Option<&PaletteSection> {
        self.sections.get(usize::try_from(y).ok()?)?.as_ref()
    }

    /// State at chunk-wide index `section_y << 12 | section_index`; air for
    /// anything outside the chunk or in a missing section.
    pub fn get_block(&self, index: i32) -> BlockStateRef {
        if !(0..=0xFFFF).contains(&index) {
            return self.air.clone();
        }
        match self.section(index >> 12) {
            Some(section) => section.get_block(index & 4095),
            None => self.air.clone(),
        }
    }

    fn upgrade_data(&self) -> UpgradeData {
        let mut data = UpgradeData {
            sides: self.sides,
            ..Default::default()
        };
        for section in self.sections.iter().flatten() {
            data.indices.insert(section.y(), section.update_indices().to_vec());
        }
        data
    }
}

impl DecodedChunk {
    pub fn chunk(&self) -> &ChunkUpgrade {
        &self.chunk
    }

    pub fn apply_fixes(mut self) -> FixedChunk {
        let chunk = &mut self.chunk;
        let mut ctx = FixContext {
            sections: &mut chunk.sections,
            block_entities: &mut chunk.block_entities,
            air: &chunk.air,
            alpha_format: chunk.alpha_format,
            tables: FixTables::shared(),
        };
        run_fixes(&mut ctx);
        FixedChunk { chunk: self.chunk }
    }
}

impl FixedChunk {
    pub fn chunk(&self) -> &ChunkUpgrade {
        &self.chunk
    }

    /// Emits the converted `Level` compound with its `UpgradeData`.
    pub fn write(self) -> Result<NbtCompound> {
        let upgrade_data = self.chunk.upgrade_data();
        let ChunkUpgrade {
            mut level,
            x,
            z,
            sections,
            block_entities,
            sides,
            ..
        } = self.chunk;

        if !block_entities.is_empty() {
            let records: Vec<NbtTag> = block_entities
                .into_records()
                .into_iter()
                .map(NbtTag::Compound)
                .collect();
            level.insert("TileEntities", NbtTag::List(NbtList::from(records)));
        }

        let mut written = Vec::new();
        for section in sections.into_iter().flatten() {
            written.push(NbtTag::Compound(section.write()?));
        }
        debug!(
            "Converted chunk {}x{}: {} sections, sides {}",
            x,
            z,
            written.len(),
            sides
        );

        level.insert("UpgradeData", NbtTag::Compound(upgrade_data.to_nbt()));
        level.insert("Sections", NbtTag::List(NbtList::from(written)));
        Ok(level)
    }
}

/// Removes list `key` from `level` and returns its compound entries.
fn take_compounds(level: &mut NbtCompound, key: &str) -> Vec<NbtCompound> {
    match level.inner_mut().remove(key) {
        Some(NbtTag::List(list)) => list
            .iter()
            .filter_map(|tag| match tag {
                NbtTag::Compound(compound) => Some(compound.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Converts a legacy `Level` compound.
pub fn upgrade_level(
    level: NbtCompound,
    states: &dyn LegacyBlockStates,
    settings: &UpgradeSettings,
) -> Result<NbtCompound> {
    ChunkUpgrade::decode(level, states, settings)?
        .apply_fixes()
        .write()
}

/// Converts a chunk root compound whose `Level` holds the legacy data.
pub fn upgrade_chunk(
    mut root: NbtCompound,
    states: &dyn LegacyBlockStates,
    settings: &UpgradeSettings,
) -> Result<NbtCompound> {
    let level = match root.inner_mut().remove("Level") {
        Some(NbtTag::Compound(level)) => level,
        _ => return Err(UpgradeError::MissingLevel),
    };
    root.insert("Level", NbtTag::Compound(upgrade_level(level, states, settings)?));
    Ok(root)
}
