//! Lenient readers over `quartz_nbt` compounds.
//!
//! Legacy chunks were written by many different game versions, so the same
//! field shows up as a Byte in one chunk and an Int in the next. These
//! helpers accept any numeric tag and fall back to `None` instead of failing.

use quartz_nbt::{NbtCompound, NbtTag};

pub fn int(compound: &NbtCompound, key: &str) -> Option<i32> {
    match compound.inner().get(key)? {
        NbtTag::Byte(v) => Some(*v as i32),
        NbtTag::Short(v) => Some(*v as i32),
        NbtTag::Int(v) => Some(*v),
        NbtTag::Long(v) => Some(*v as i32),
        NbtTag::Float(v) => Some(*v as i32),
        NbtTag::Double(v) => Some(*v as i32),
        _ => None,
    }
}

pub fn int_or(compound: &NbtCompound, key: &str, default: i32) -> i32 {
    int(compound, key).unwrap_or(default)
}

/// Numeric tags are true when non-zero; anything else reads as `false`.
pub fn boolean(compound: &NbtCompound, key: &str) -> bool {
    compound
        .inner()
        .get(key)
        .and_then(|tag| match tag {
            NbtTag::Byte(v) => Some(*v != 0),
            NbtTag::Short(v) => Some(*v != 0),
            NbtTag::Int(v) => Some(*v != 0),
            NbtTag::Long(v) => Some(*v != 0),
            _ => None,
        })
        .unwrap_or(false)
}

pub fn string<'a>(compound: &'a NbtCompound, key: &str) -> Option<&'a str> {
    match compound.inner().get(key)? {
        NbtTag::String(s) => Some(s.as_str()),
        _ => None,
    }
}

pub fn byte_array<'a>(compound: &'a NbtCompound, key: &str) -> Option<&'a [i8]> {
    match compound.inner().get(key)? {
        NbtTag::ByteArray(bytes) => Some(bytes.as_slice()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_accepts_every_numeric_width() {
        let mut nbt = NbtCompound::new();
        nbt.insert("b", NbtTag::Byte(-3));
        nbt.insert("s", NbtTag::Short(300));
        nbt.insert("l", NbtTag::Long(70_000));
        nbt.insert("name", "x".to_string());

        assert_eq!(int(&nbt, "b"), Some(-3));
        assert_eq!(int(&nbt, "s"), Some(300));
        assert_eq!(int(&nbt, "l"), Some(70_000));
        assert_eq!(int(&nbt, "name"), None);
        assert_eq!(int_or(&nbt, "missing", 7), 7);
    }

    #[test]
    fn test_boolean_defaults_to_false() {
        let mut nbt = NbtCompound::new();
        nbt.insert("on", NbtTag::Byte(1));
        nbt.insert("off", NbtTag::Byte(0));
        nbt.insert("text", "true".to_string());

        assert!(boolean(&nbt, "on"));
        assert!(!boolean(&nbt, "off"));
        assert!(!boolean(&nbt, "text"));
        assert!(!boolean(&nbt, "missing"));
    }
}
