//! Legacy `id << 4 | data` codes to modern block states.
//!
//! The mapping data itself is supplied by the caller; this module only
//! defines the lookup contract and a caching table that satisfies it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::block_state::{BlockState, BlockStateRef};
use crate::error::{Result, UpgradeError};

/// Number of codes addressable without the `Add` extension nibble.
pub const LEGACY_CODE_COUNT: usize = 4096;

/// Resolves legacy codes to shared block states.
///
/// Implementations should return the same `Arc` for equal codes: section
/// palettes deduplicate by pointer, not by value.
pub trait LegacyBlockStates {
    fn air(&self) -> BlockStateRef;

    fn from_legacy_code(&self, code: u16) -> BlockStateRef;
}

/// Table of 4096 cached states indexed by `id << 4 | data`.
///
/// Unregistered codes fall back to the block's data-0 state, then to air.
/// Codes carrying an `Add` nibble (>= 4096) always resolve to air.
#[derive(Debug, Clone)]
pub struct LegacyStateTable {
    air: BlockStateRef,
    states: Vec<Option<BlockStateRef>>,
}

impl Default for LegacyStateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LegacyStateTable {
    pub fn new() -> Self {
        let air = Arc::new(BlockState::air());
        let mut states = vec![None; LEGACY_CODE_COUNT];
        states[0] = Some(air.clone());
        LegacyStateTable { air, states }
    }

    /// Registers `state` for `code`. Registering code 0 replaces air.
    pub fn register(&mut self, code: u16, state: BlockState) -> BlockStateRef {
        let state = Arc::new(state);
        if code == 0 {
            self.air = state.clone();
        }
        if let Some(slot) = self.states.get_mut(code as usize) {
            *slot = Some(state.clone());
        }
        state
    }

    pub fn register_str(&mut self, code: u16, state: &str) -> Result<BlockStateRef> {
        Ok(self.register(code, BlockState::parse(state)?))
    }

    /// Reads `{ "<code>": "<block state>", ... }`.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(json)?;
        let mut entries = entries
            .into_iter()
            .map(|(code, state)| {
                let parsed = code
                    .trim()
                    .parse::<u16>()
                    .ok()
                    .filter(|&c| (c as usize) < LEGACY_CODE_COUNT)
                    .ok_or(UpgradeError::InvalidLegacyCode(code))?;
                Ok((parsed, state))
            })
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(|(code, _)| *code);

        let mut table = LegacyStateTable::new();
        for (code, state) in entries {
            table.register_str(code, &state)?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.states.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LegacyBlockStates for LegacyStateTable {
    fn air(&self) -> BlockStateRef {
        self.air.clone()
    }

    fn from_legacy_code(&self, code: u16) -> BlockStateRef {
        let code = code as usize;
        if code >= LEGACY_CODE_COUNT {
            return self.air.clone();
        }
        self.states[code]
            .as_ref()
            .or(self.states[code & !0x0F].as_ref())
            .cloned()
            .unwrap_or_else(|| self.air.clone())
    }
}
