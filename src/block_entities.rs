//! Block entities of one chunk, keyed by chunk-local packed position.
//!
//! Fix rules either `take` a record (it leaves the chunk unless the rule
//! puts it back) or `peek` at it (it is written back untouched).

use quartz_nbt::NbtCompound;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::position::pack_local;
use crate::tag;

#[derive(Debug, Clone, Default)]
pub struct BlockEntityTable {
    // first-insertion order of every key that is, or once was, present
    order: Vec<i32>,
    seen: FxHashSet<i32>,
    records: FxHashMap<i32, NbtCompound>,
}

impl BlockEntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local key of a block entity record whose absolute coordinates sit
    /// in the chunk starting at block `(chunk_x, chunk_z)`.
    pub fn local_key(record: &NbtCompound, chunk_x: i32, chunk_z: i32) -> i32 {
        let x = tag::int_or(record, "x", 0).wrapping_sub(chunk_x) & 15;
        let y = tag::int_or(record, "y", 0);
        let z = tag::int_or(record, "z", 0).wrapping_sub(chunk_z) & 15;
        pack_local(x, y, z)
    }

    /// Stores `record` at `pos`, returning the record it replaced. A
    /// replaced or re-inserted key keeps its original slot in the output.
    pub fn insert(&mut self, pos: i32, record: NbtCompound) -> Option<NbtCompound> {
        let previous = self.records.insert(pos, record);
        if self.seen.insert(pos) {
            self.order.push(pos);
        }
        previous
    }

    /// Removes and returns the record at `pos`.
    pub fn take(&mut self, pos: i32) -> Option<NbtCompound> {
        self.records.remove(&pos)
    }

    /// Reads the record at `pos` without consuming it.
    pub fn peek(&self, pos: i32) -> Option<&NbtCompound> {
        self.records.get(&pos)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remaining records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &NbtCompound)> + '_ {
        self.order
            .iter()
            .filter_map(move |pos| self.records.get(pos).map(|record| (*pos, record)))
    }

    pub fn into_records(self) -> Vec<NbtCompound> {
        let BlockEntityTable {
            order, mut records, ..
        } = self;
        order
            .into_iter()
            .filter_map(|pos| records.remove(&pos))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, x: i32, y: i32, z: i32) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        nbt.insert("id", id.to_string());
        nbt.insert("x", x);
        nbt.insert("y", y);
        nbt.insert("z", z);
        nbt
    }

    #[test]
    fn test_local_key_masks_horizontal_coordinates() {
        // chunk (2, -1) starts at block (32, -16)
        let chest = record("minecraft:chest", 35, 70, -3);
        assert_eq!(BlockEntityTable::local_key(&chest, 32, -16), pack_local(3, 70, 13));

        // records that drifted outside the chunk wrap back into it
        let stray = record("minecraft:chest", 50, 5, -20);
        assert_eq!(BlockEntityTable::local_key(&stray, 32, -16), pack_local(2, 5, 12));
    }

    #[test]
    fn test_local_key_tolerates_extreme_coordinates() {
        let broken = record("minecraft:chest", i32::MIN, 0, i32::MAX);
        assert_eq!(BlockEntityTable::local_key(&broken, 16, -16), pack_local(0, 0, 15));
    }

    #[test]
    fn test_many_records_keep_insertion_order() {
        let mut table = BlockEntityTable::new();
        let keys: Vec<i32> = (0..4096).rev().collect();
        for &pos in &keys {
            table.insert(pos, record("minecraft:sign", pos & 15, pos >> 8, (pos >> 4) & 15));
        }
        assert_eq!(table.len(), 4096);
        let order: Vec<i32> = table.iter().map(|(pos, _)| pos).collect();
        assert_eq!(order, keys);
    }

    #[test]
    fn test_take_and_peek() {
        let mut table = BlockEntityTable::new();
        table.insert(10, record("minecraft:noteblock", 10, 0, 0));
        table.insert(20, record("minecraft:bed", 4, 0, 1));

        assert!(table.peek(20).is_some());
        assert_eq!(table.len(), 2);

        let taken = table.take(10).unwrap();
        assert_eq!(tag::string(&taken, "id"), Some("minecraft:noteblock"));
        assert!(table.take(10).is_none());
        assert!(table.peek(10).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_returns_previous_and_keeps_slot() {
        let mut table = BlockEntityTable::new();
        table.insert(1, record("a", 1, 0, 0));
        table.insert(2, record("b", 2, 0, 0));
        let previous = table.insert(1, record("c", 1, 0, 0)).unwrap();
        assert_eq!(tag::string(&previous, "id"), Some("a"));

        let ids: Vec<_> = table
            .into_records()
            .iter()
            .map(|r| tag::string(r, "id").unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_restored_record_keeps_original_slot() {
        let mut table = BlockEntityTable::new();
        table.insert(5, record("skull", 5, 0, 0));
        table.insert(6, record("sign", 6, 0, 0));

        let skull = table.take(5).unwrap();
        table.insert(5, skull);

        let keys: Vec<i32> = table.iter().map(|(pos, _)| pos).collect();
        assert_eq!(keys, vec![5, 6]);
    }
}
