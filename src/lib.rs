//! Converts pre-flattening chunks, whose sections store a block id byte
//! and a data nibble per cell, into paletted sections with bit-packed
//! block states.
//!
//! ```no_run
//! use palettize::{upgrade_chunk, LegacyStateTable, UpgradeSettings};
//! # fn run(chunk: quartz_nbt::NbtCompound, mapping_json: &str) -> palettize::Result<()> {
//! let states = LegacyStateTable::from_json(mapping_json)?;
//! let converted = upgrade_chunk(chunk, &states, &UpgradeSettings::default())?;
//! # let _ = converted;
//! # Ok(())
//! # }
//! ```

pub mod block_entities;
pub mod block_state;
pub mod chunk;
pub mod classify;
pub mod error;
pub mod fixes;
pub mod legacy_states;
pub mod nibble;
pub mod packed;
pub mod position;
pub mod section;
pub mod settings;
pub mod tag;
pub mod upgrade_data;

pub use block_entities::BlockEntityTable;
pub use block_state::{BlockState, BlockStateRef};
pub use chunk::{upgrade_chunk, upgrade_level, ChunkUpgrade, ChunkWarning, DecodedChunk, FixedChunk};
pub use error::{Result, UpgradeError};
pub use fixes::{FixRule, FixTables};
pub use legacy_states::{LegacyBlockStates, LegacyStateTable};
pub use nibble::NibbleLayer;
pub use packed::PackedBitStorage;
pub use position::{relative, Direction};
pub use section::PaletteSection;
pub use settings::UpgradeSettings;
pub use upgrade_data::{SideMask, UpgradeData};
