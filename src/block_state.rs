use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Result, UpgradeError};

/// Shared handle to a block state. Palettes compare these by pointer, so a
/// codec that wants equal states merged must hand out the same `Arc`.
pub type BlockStateRef = Arc<BlockState>;

/// Name of the placeholder state a codec may return for cells that should
/// be written out as air.
pub const FILTER_MARKER: &str = "%%FILTER_ME%%";

pub const AIR_NAME: &str = "minecraft:air";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockState {
    pub name: SmolStr,
    pub properties: Vec<(SmolStr, SmolStr)>,
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.properties.is_empty() {
            write!(f, "[")?;
            for (i, (key, value)) in self.properties.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl Hash for BlockState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        for (k, v) in &self.properties {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl BlockState {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        BlockState {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn air() -> Self {
        BlockState::new(AIR_NAME)
    }

    /// Parses `namespace:id` or `namespace:id[key=value,...]`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let invalid = || UpgradeError::InvalidBlockState(input.to_string());

        let (name, props) = match input.find('[') {
            Some(open) => {
                let rest = input[open + 1..].strip_suffix(']').ok_or_else(invalid)?;
                (&input[..open], Some(rest))
            }
            None => (input, None),
        };
        if name.is_empty() || name.contains(']') {
            return Err(invalid());
        }

        let mut state = BlockState::new(name);
        if let Some(props) = props.filter(|p| !p.trim().is_empty()) {
            for pair in props.split(',') {
                let (key, value) = pair.split_once('=').ok_or_else(invalid)?;
                let (key, value) = (key.trim(), value.trim());
                if key.is_empty() {
                    return Err(invalid());
                }
                state.set_property(key, value);
            }
        }
        Ok(state)
    }

    pub fn get_name(&self) -> &str {
        self.name.as_str()
    }

    pub fn is_filter_marker(&self) -> bool {
        self.name == FILTER_MARKER
    }

    pub fn with_property(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn set_property(&mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) {
        let key = key.into();
        let value = value.into();
        for (k, v) in &mut self.properties {
            if *k == key {
                *v = value;
                return;
            }
        }
        self.properties.push((key, value));
    }

    pub fn get_property(&self, key: &str) -> Option<&SmolStr> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Property value or the empty string, which is what the lookup keys
    /// built by the fix rules expect for absent properties.
    pub fn property_or_empty(&self, key: &str) -> &str {
        self.get_property(key).map(|v| v.as_str()).unwrap_or("")
    }

    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("Name", self.name.to_string());

        if !self.properties.is_empty() {
            let mut properties = NbtCompound::new();
            for (key, value) in &self.properties {
                properties.insert(key.to_string(), value.to_string());
            }
            compound.insert("Properties", properties);
        }

        NbtTag::Compound(compound)
    }

    pub fn from_nbt(compound: &NbtCompound) -> Result<Self> {
        let name: SmolStr = compound
            .get::<_, &str>("Name")
            .map_err(|_| UpgradeError::FieldType("Name"))?
            .into();

        let mut properties = Vec::new();
        if let Ok(props) = compound.get::<_, &NbtCompound>("Properties") {
            for (key, value) in props.inner() {
                if let NbtTag::String(value_str) = value {
                    properties.push((key.into(), value_str.into()));
                }
            }
        }

        Ok(BlockState { name, properties })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_state_creation() {
        let block = BlockState::new("minecraft:oak_door").with_property("half", "lower");

        assert_eq!(block.name, "minecraft:oak_door");
        assert_eq!(
            block.get_property("half").map(|s| s.as_str()),
            Some("lower")
        );
        assert_eq!(block.property_or_empty("hinge"), "");
    }

    #[test]
    fn test_parse_plain_and_with_properties() {
        let plain = BlockState::parse("minecraft:stone").unwrap();
        assert_eq!(plain, BlockState::new("minecraft:stone"));

        let door = BlockState::parse("minecraft:oak_door[facing=east, half=upper]").unwrap();
        assert_eq!(door.property_or_empty("facing"), "east");
        assert_eq!(door.property_or_empty("half"), "upper");
        assert_eq!(door.to_string(), "minecraft:oak_door[facing=east,half=upper]");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(BlockState::parse("").is_err());
        assert!(BlockState::parse("minecraft:stone[facing=east").is_err());
        assert!(BlockState::parse("minecraft:stone[facing]").is_err());
    }

    #[test]
    fn test_nbt_roundtrip_keeps_properties() {
        let bed = BlockState::new("minecraft:blue_bed")
            .with_property("facing", "south")
            .with_property("part", "head");
        let NbtTag::Compound(compound) = bed.to_nbt() else {
            panic!("expected compound");
        };
        assert_eq!(compound.get::<_, &str>("Name").unwrap(), "minecraft:blue_bed");

        let back = BlockState::from_nbt(&compound).unwrap();
        assert_eq!(back.property_or_empty("part"), "head");
        assert_eq!(back.name, bed.name);
    }
}
