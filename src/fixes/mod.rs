//! Second pass over a decoded chunk: blocks whose modern state depends on
//! a neighbouring cell or on their block entity.
//!
//! Every rule sees the state the legacy table already produced for the
//! cell and may replace it. Neighbours are read chunk-wide, so a rule can
//! look into the section above or below; cells outside the chunk read as
//! air.

pub mod tables;

use quartz_nbt::NbtCompound;

use crate::block_entities::BlockEntityTable;
use crate::block_state::BlockStateRef;
use crate::position::{chunk_index, relative, Direction};
use crate::section::PaletteSection;
use crate::tag;

pub use tables::FixTables;

/// Highest note a note block can hold.
pub const MAX_NOTE: i32 = 24;

/// Blocks of one chunk, addressed by chunk-wide packed index
/// `section_y << 12 | section_index`.
pub struct FixContext<'a> {
    pub sections: &'a mut [Option<PaletteSection>],
    pub block_entities: &'a mut BlockEntityTable,
    pub air: &'a BlockStateRef,
    /// Doors of chunks converted from alpha lose their hinge and power.
    pub alpha_format: bool,
    pub tables: &'static FixTables,
}

impl<'a> FixContext<'a> {
    pub fn get_block(&self, index: i32) -> BlockStateRef {
        if !(0..=0xFFFF).contains(&index) {
            return self.air.clone();
        }
        match self.sections.get((index >> 12) as usize) {
            Some(Some(section)) => section.get_block(index & 4095),
            _ => self.air.clone(),
        }
    }

    pub fn set_block(&mut self, index: i32, state: BlockStateRef) {
        if !(0..=0xFFFF).contains(&index) {
            return;
        }
        if let Some(Some(section)) = self.sections.get_mut((index >> 12) as usize) {
            section.set_block(index & 4095, state);
        }
    }

    /// Neighbour of `index`, air when it lies outside the chunk.
    pub fn neighbour(&self, index: i32, direction: Direction) -> BlockStateRef {
        match relative(index, direction) {
            Some(moved) => self.get_block(moved),
            None => self.air.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixRule {
    /// Grass, podzol and mycelium under snow.
    SnowyGround,
    /// Carved pumpkins resting on grass or dirt.
    Pumpkin,
    /// Upper halves of double plants.
    UpperPlant,
    NoteBlock,
    FlowerPot,
    Skull,
    Bed,
    Banner,
    Door,
}

impl FixRule {
    pub fn for_legacy_id(id: u16) -> Option<FixRule> {
        let rule = match id {
            2 | 3 | 110 => FixRule::SnowyGround,
            86 => FixRule::Pumpkin,
            175 => FixRule::UpperPlant,
            25 => FixRule::NoteBlock,
            140 => FixRule::FlowerPot,
            144 => FixRule::Skull,
            26 => FixRule::Bed,
            176 | 177 => FixRule::Banner,
            64 | 71 | 193 | 194 | 195 | 196 | 197 => FixRule::Door,
            _ => return None,
        };
        Some(rule)
    }

    /// Applies the rule to the cell at chunk-wide `index`.
    pub fn apply(self, ctx: &mut FixContext<'_>, index: i32) {
        match self {
            FixRule::SnowyGround => fix_snowy_ground(ctx, index),
            FixRule::Pumpkin => fix_pumpkin(ctx, index),
            FixRule::UpperPlant => fix_upper_plant(ctx, index),
            FixRule::NoteBlock => fix_note_block(ctx, index),
            FixRule::FlowerPot => fix_flower_pot(ctx, index),
            FixRule::Skull => fix_skull(ctx, index),
            FixRule::Bed => fix_bed(ctx, index),
            FixRule::Banner => fix_banner(ctx, index),
            FixRule::Door => fix_door(ctx, index),
        }
    }
}

/// Runs every recorded fix, section by section in ascending Y.
pub fn run_fixes(ctx: &mut FixContext<'_>) {
    for section_y in 0..ctx.sections.len() {
        let pending: Vec<(u16, Vec<u16>)> = match &ctx.sections[section_y] {
            Some(section) => section.to_fix().to_vec(),
            None => continue,
        };
        for (id, cells) in pending {
            let Some(rule) = FixRule::for_legacy_id(id) else {
                continue;
            };
            for cell in cells {
                rule.apply(ctx, chunk_index(section_y as i32, cell));
            }
        }
    }
}

fn is_snow(state: &BlockStateRef) -> bool {
    matches!(state.get_name(), "minecraft:snow" | "minecraft:snow_layer")
}

fn fix_snowy_ground(ctx: &mut FixContext<'_>, index: i32) {
    let lookup = ctx.tables;
    let state = ctx.get_block(index);
    let Some(snowy) = lookup.snowy_variant(state.get_name()) else {
        return;
    };
    if is_snow(&ctx.neighbour(index, Direction::Up)) {
        ctx.set_block(index, snowy.clone());
    }
}

fn fix_pumpkin(ctx: &mut FixContext<'_>, index: i32) {
    if ctx.get_block(index).get_name() != "minecraft:carved_pumpkin" {
        return;
    }
    let below = ctx.neighbour(index, Direction::Down);
    if matches!(below.get_name(), "minecraft:grass_block" | "minecraft:dirt") {
        let pumpkin = ctx.tables.pumpkin.clone();
        ctx.set_block(index, pumpkin);
    }
}

fn fix_upper_plant(ctx: &mut FixContext<'_>, index: i32) {
    if ctx.get_block(index).property_or_empty("half") != "upper" {
        return;
    }
    let lookup = ctx.tables;
    let below = ctx.neighbour(index, Direction::Down);
    if let Some(upper) = lookup.upper_plants.get(below.get_name()) {
        ctx.set_block(index, upper.clone());
    }
}

fn fix_note_block(ctx: &mut FixContext<'_>, index: i32) {
    let lookup = ctx.tables;
    let Some(record) = ctx.block_entities.take(index) else {
        return;
    };
    let powered = tag::boolean(&record, "powered");
    let note = tag::int_or(&record, "note", 0).clamp(0, MAX_NOTE);
    let key = format!("{}{}", powered, note);

    let notes = &lookup.note_blocks;
    if let Some(state) = notes.get(&key).or_else(|| notes.get(tables::NOTE_BLOCK_DEFAULT)) {
        ctx.set_block(index, state.clone());
    }
}

fn fix_flower_pot(ctx: &mut FixContext<'_>, index: i32) {
    let lookup = ctx.tables;
    let Some(record) = ctx.block_entities.take(index) else {
        return;
    };
    let key = format!(
        "{}{}",
        tag::string(&record, "Item").unwrap_or(""),
        tag::int_or(&record, "Data", 0)
    );

    let pots = &lookup.flower_pots;
    if let Some(state) = pots.get(&key).or_else(|| pots.get(tables::FLOWER_POT_DEFAULT)) {
        ctx.set_block(index, state.clone());
    }
}

fn fix_skull(ctx: &mut FixContext<'_>, index: i32) {
    let lookup = ctx.tables;
    let Some(mut record) = ctx.block_entities.take(index) else {
        return;
    };
    let skull_type = tag::int_or(&record, "SkullType", 0);
    let state = ctx.get_block(index);
    let facing = state.property_or_empty("facing");
    let key = if facing == "up" || facing == "down" {
        format!("{}{}", skull_type, tag::int_or(&record, "Rot", 0))
    } else {
        format!("{}{}", skull_type, facing)
    };

    strip(&mut record, &["SkullType", "facing", "Rot"]);
    ctx.block_entities.insert(index, record);

    let skulls = &lookup.skulls;
    if let Some(state) = skulls.get(&key).or_else(|| skulls.get(tables::SKULL_DEFAULT)) {
        ctx.set_block(index, state.clone());
    }
}

fn strip(record: &mut NbtCompound, keys: &[&str]) {
    let inner = record.inner_mut();
    for key in keys {
        inner.remove(*key);
    }
}

fn fix_bed(ctx: &mut FixContext<'_>, index: i32) {
    let lookup = ctx.tables;
    let Some(record) = ctx.block_entities.peek(index) else {
        return;
    };
    let color = tag::int_or(record, "color", 0);
    if color == tables::DEFAULT_BED_COLOR || !(0..16).contains(&color) {
        return;
    }
    let state = ctx.get_block(index);
    let key = format!(
        "{}{}{}{}",
        state.property_or_empty("facing"),
        state.property_or_empty("occupied"),
        state.property_or_empty("part"),
        color
    );
    if let Some(bed) = lookup.beds.get(&key) {
        ctx.set_block(index, bed.clone());
    }
}

fn fix_banner(ctx: &mut FixContext<'_>, index: i32) {
    let lookup = ctx.tables;
    let Some(record) = ctx.block_entities.peek(index) else {
        return;
    };
    let base = tag::int_or(record, "Base", 0);
    if base == tables::DEFAULT_BANNER_BASE || !(0..16).contains(&base) {
        return;
    }
    let state = ctx.get_block(index);
    // standing banners carry a rotation, wall banners a facing
    let placement = state
        .get_property("rotation")
        .or_else(|| state.get_property("facing"))
        .map(|v| v.as_str())
        .unwrap_or("");
    let key = format!("{}_{}", placement, base);
    if let Some(banner) = lookup.banners.get(&key) {
        ctx.set_block(index, banner.clone());
    }
}

fn fix_door(ctx: &mut FixContext<'_>, index: i32) {
    let lookup = ctx.tables;
    let lower = ctx.get_block(index);
    if lower.property_or_empty("half") != "lower" {
        return;
    }
    let Some(upper_index) = relative(index, Direction::Up) else {
        return;
    };
    let upper = ctx.get_block(upper_index);
    if lower.get_name() != upper.get_name() {
        return;
    }

    let name = lower.get_name();
    let facing = lower.property_or_empty("facing");
    let open = lower.property_or_empty("open");
    let (hinge, powered) = if ctx.alpha_format {
        ("left", "false")
    } else {
        (upper.property_or_empty("hinge"), upper.property_or_empty("powered"))
    };

    let doors = &lookup.doors;
    let lower_key = format!("{}{}lower{}{}{}", name, facing, hinge, open, powered);
    let upper_key = format!("{}{}upper{}{}{}", name, facing, hinge, open, powered);
    if let (Some(new_lower), Some(new_upper)) = (doors.get(&lower_key), doors.get(&upper_key)) {
        let (new_lower, new_upper) = (new_lower.clone(), new_upper.clone());
        ctx.set_block(index, new_lower);
        ctx.set_block(upper_index, new_upper);
    }
}
