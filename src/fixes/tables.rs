//! Pre-registered replacement states, keyed by the strings the fix rules
//! compose from block properties and block entity fields.
//!
//! Every entry is built once per process, so a rule that picks the same
//! key twice hands the same `Arc` to the palette.

use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;

use crate::block_state::{BlockState, BlockStateRef};

use super::MAX_NOTE;

/// Dye names by legacy color id.
pub const DYE_COLORS: [&str; 16] = [
    "white",
    "orange",
    "magenta",
    "light_blue",
    "yellow",
    "lime",
    "pink",
    "gray",
    "light_gray",
    "cyan",
    "purple",
    "blue",
    "brown",
    "green",
    "red",
    "black",
];

pub const DOORS: [&str; 7] = [
    "minecraft:oak_door",
    "minecraft:iron_door",
    "minecraft:spruce_door",
    "minecraft:birch_door",
    "minecraft:jungle_door",
    "minecraft:acacia_door",
    "minecraft:dark_oak_door",
];

/// Double plants with a distinct upper half.
pub const DOUBLE_PLANTS: [&str; 6] = [
    "minecraft:sunflower",
    "minecraft:lilac",
    "minecraft:tall_grass",
    "minecraft:large_fern",
    "minecraft:rose_bush",
    "minecraft:peony",
];

const HORIZONTAL: [&str; 4] = ["north", "east", "south", "west"];

/// Legacy `SkullType` id to the floor and wall block names.
const SKULLS: [(&str, &str); 6] = [
    ("minecraft:skeleton_skull", "minecraft:skeleton_wall_skull"),
    ("minecraft:wither_skeleton_skull", "minecraft:wither_skeleton_wall_skull"),
    ("minecraft:zombie_head", "minecraft:zombie_wall_head"),
    ("minecraft:player_head", "minecraft:player_wall_head"),
    ("minecraft:creeper_head", "minecraft:creeper_wall_head"),
    ("minecraft:dragon_head", "minecraft:dragon_wall_head"),
];

/// `Item` + `Data` of a legacy flower pot to the potted block.
const POTTED: [(&str, &str); 22] = [
    ("minecraft:air0", "minecraft:flower_pot"),
    ("minecraft:red_flower0", "minecraft:potted_poppy"),
    ("minecraft:red_flower1", "minecraft:potted_blue_orchid"),
    ("minecraft:red_flower2", "minecraft:potted_allium"),
    ("minecraft:red_flower3", "minecraft:potted_azure_bluet"),
    ("minecraft:red_flower4", "minecraft:potted_red_tulip"),
    ("minecraft:red_flower5", "minecraft:potted_orange_tulip"),
    ("minecraft:red_flower6", "minecraft:potted_white_tulip"),
    ("minecraft:red_flower7", "minecraft:potted_pink_tulip"),
    ("minecraft:red_flower8", "minecraft:potted_oxeye_daisy"),
    ("minecraft:yellow_flower0", "minecraft:potted_dandelion"),
    ("minecraft:sapling0", "minecraft:potted_oak_sapling"),
    ("minecraft:sapling1", "minecraft:potted_spruce_sapling"),
    ("minecraft:sapling2", "minecraft:potted_birch_sapling"),
    ("minecraft:sapling3", "minecraft:potted_jungle_sapling"),
    ("minecraft:sapling4", "minecraft:potted_acacia_sapling"),
    ("minecraft:sapling5", "minecraft:potted_dark_oak_sapling"),
    ("minecraft:red_mushroom0", "minecraft:potted_red_mushroom"),
    ("minecraft:brown_mushroom0", "minecraft:potted_brown_mushroom"),
    ("minecraft:deadbush0", "minecraft:potted_dead_bush"),
    ("minecraft:tallgrass2", "minecraft:potted_fern"),
    ("minecraft:cactus0", "minecraft:potted_cactus"),
];

pub const NOTE_BLOCK_DEFAULT: &str = "false0";
pub const FLOWER_POT_DEFAULT: &str = "minecraft:air0";
pub const SKULL_DEFAULT: &str = "0north";

/// Red; legacy beds already convert to the red bed.
pub const DEFAULT_BED_COLOR: i32 = 14;
/// White; legacy banners already convert to the white banner.
pub const DEFAULT_BANNER_BASE: i32 = 15;

#[derive(Debug)]
pub struct FixTables {
    pub snowy_grass: BlockStateRef,
    pub snowy_podzol: BlockStateRef,
    pub snowy_mycelium: BlockStateRef,
    pub pumpkin: BlockStateRef,
    /// Lower-half plant name to the matching upper half.
    pub upper_plants: FxHashMap<&'static str, BlockStateRef>,
    pub note_blocks: FxHashMap<String, BlockStateRef>,
    pub flower_pots: FxHashMap<String, BlockStateRef>,
    pub skulls: FxHashMap<String, BlockStateRef>,
    pub doors: FxHashMap<String, BlockStateRef>,
    pub beds: FxHashMap<String, BlockStateRef>,
    pub banners: FxHashMap<String, BlockStateRef>,
}

static TABLES: OnceLock<FixTables> = OnceLock::new();

impl FixTables {
    pub fn shared() -> &'static FixTables {
        TABLES.get_or_init(FixTables::build)
    }

    fn build() -> FixTables {
        let upper_plants = DOUBLE_PLANTS
            .iter()
            .map(|&name| (name, Arc::new(BlockState::new(name).with_property("half", "upper"))))
            .collect();

        FixTables {
            snowy_grass: snowy("minecraft:grass_block"),
            snowy_podzol: snowy("minecraft:podzol"),
            snowy_mycelium: snowy("minecraft:mycelium"),
            pumpkin: Arc::new(BlockState::new("minecraft:pumpkin")),
            upper_plants,
            note_blocks: note_blocks(),
            flower_pots: POTTED
                .iter()
                .map(|&(key, name)| (key.to_string(), Arc::new(BlockState::new(name))))
                .collect(),
            skulls: skulls(),
            doors: doors(),
            beds: beds(),
            banners: banners(),
        }
    }

    pub fn snowy_variant(&self, name: &str) -> Option<&BlockStateRef> {
        match name {
            "minecraft:grass_block" => Some(&self.snowy_grass),
            "minecraft:podzol" => Some(&self.snowy_podzol),
            "minecraft:mycelium" => Some(&self.snowy_mycelium),
            _ => None,
        }
    }
}

fn snowy(name: &str) -> BlockStateRef {
    Arc::new(BlockState::new(name).with_property("snowy", "true"))
}

fn note_blocks() -> FxHashMap<String, BlockStateRef> {
    let mut map = FxHashMap::default();
    for note in 0..=MAX_NOTE {
        for powered in ["true", "false"] {
            let state = BlockState::new("minecraft:note_block")
                .with_property("powered", powered)
                .with_property("note", note.to_string());
            map.insert(format!("{}{}", powered, note), Arc::new(state));
        }
    }
    map
}

fn skulls() -> FxHashMap<String, BlockStateRef> {
    let mut map = FxHashMap::default();
    for (skull_type, (floor, wall)) in SKULLS.iter().enumerate() {
        for facing in HORIZONTAL {
            let state = BlockState::new(*wall).with_property("facing", facing);
            map.insert(format!("{}{}", skull_type, facing), Arc::new(state));
        }
        for rotation in 0..16 {
            let state = BlockState::new(*floor).with_property("rotation", rotation.to_string());
            map.insert(format!("{}{}", skull_type, rotation), Arc::new(state));
        }
    }
    map
}

fn doors() -> FxHashMap<String, BlockStateRef> {
    let mut map = FxHashMap::default();
    for name in DOORS {
        for facing in HORIZONTAL {
            for half in ["lower", "upper"] {
                for hinge in ["left", "right"] {
                    for open in ["true", "false"] {
                        for powered in ["true", "false"] {
                            let state = BlockState::new(name)
                                .with_property("facing", facing)
                                .with_property("half", half)
                                .with_property("hinge", hinge)
                                .with_property("open", open)
                                .with_property("powered", powered);
                            let key = format!("{}{}{}{}{}{}", name, facing, half, hinge, open, powered);
                            map.insert(key, Arc::new(state));
                        }
                    }
                }
            }
        }
    }
    map
}

fn beds() -> FxHashMap<String, BlockStateRef> {
    let mut map = FxHashMap::default();
    for (color, dye) in DYE_COLORS.iter().enumerate() {
        if color as i32 == DEFAULT_BED_COLOR {
            continue;
        }
        let name = format!("minecraft:{}_bed", dye);
        for facing in HORIZONTAL {
            for occupied in ["true", "false"] {
                for part in ["head", "foot"] {
                    let state = BlockState::new(name.as_str())
                        .with_property("facing", facing)
                        .with_property("occupied", occupied)
                        .with_property("part", part);
                    map.insert(format!("{}{}{}{}", facing, occupied, part, color), Arc::new(state));
                }
            }
        }
    }
    map
}

/// Keys use the legacy `Base`, which counts colors backwards from black.
fn banners() -> FxHashMap<String, BlockStateRef> {
    let mut map = FxHashMap::default();
    for (dye_id, dye) in DYE_COLORS.iter().enumerate() {
        let base = 15 - dye_id as i32;
        if base == DEFAULT_BANNER_BASE {
            continue;
        }
        let standing = format!("minecraft:{}_banner", dye);
        for rotation in 0..16 {
            let state = BlockState::new(standing.as_str()).with_property("rotation", rotation.to_string());
            map.insert(format!("{}_{}", rotation, base), Arc::new(state));
        }
        let wall = format!("minecraft:{}_wall_banner", dye);
        for facing in HORIZONTAL {
            let state = BlockState::new(wall.as_str()).with_property("facing", facing);
            map.insert(format!("{}_{}", facing, base), Arc::new(state));
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        let tables = FixTables::shared();
        assert_eq!(tables.note_blocks.len(), 2 * (MAX_NOTE as usize + 1));
        assert!(tables.note_blocks.contains_key("true24"));
        assert!(!tables.note_blocks.contains_key("false25"));
        assert_eq!(tables.flower_pots.len(), 22);
        assert_eq!(tables.skulls.len(), 6 * (4 + 16));
        assert_eq!(tables.doors.len(), 7 * 4 * 2 * 2 * 2 * 2);
        assert_eq!(tables.beds.len(), 15 * 4 * 2 * 2);
        assert_eq!(tables.banners.len(), 15 * (16 + 4));
    }

    #[test]
    fn test_shared_tables_hand_out_one_instance() {
        let a = &FixTables::shared().note_blocks["true24"];
        let b = &FixTables::shared().note_blocks["true24"];
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(a.property_or_empty("note"), "24");
    }

    #[test]
    fn test_defaults_are_registered() {
        let tables = FixTables::shared();
        assert_eq!(tables.note_blocks[NOTE_BLOCK_DEFAULT].property_or_empty("powered"), "false");
        assert_eq!(tables.flower_pots[FLOWER_POT_DEFAULT].name, "minecraft:flower_pot");
        assert_eq!(tables.skulls[SKULL_DEFAULT].name, "minecraft:skeleton_wall_skull");
    }

    #[test]
    fn test_red_bed_and_white_banner_have_no_entries() {
        let tables = FixTables::shared();
        assert!(!tables.beds.contains_key("northfalsehead14"));
        assert_eq!(tables.beds["northfalsehead11"].name, "minecraft:blue_bed");

        assert!(!tables.banners.contains_key("3_15"));
        assert_eq!(tables.banners["3_0"].name, "minecraft:black_banner");
        assert_eq!(tables.banners["east_4"].name, "minecraft:blue_wall_banner");
    }

    #[test]
    fn test_skull_keys() {
        let tables = FixTables::shared();
        assert_eq!(tables.skulls["4west"].name, "minecraft:creeper_wall_head");
        assert_eq!(tables.skulls["112"].name, "minecraft:wither_skeleton_skull");
        assert_eq!(tables.skulls["112"].property_or_empty("rotation"), "12");
    }
}
