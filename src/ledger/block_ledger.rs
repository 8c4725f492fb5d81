// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::base58::dhash;
use crate::primitives::AssetId;

/// Ordered audit trail of the balance mutations of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLedger {
    block_index: u32,
    entries: Vec<String>,
}

impl BlockLedger {
    #[must_use]
    pub fn new(block_index: u32) -> Self {
        Self {
            block_index,
            entries: vec![],
        }
    }

    pub fn push(&mut self, address: &str, asset: AssetId, quantity: u64) {
        self.entries
            .push(format!("{}{address}{asset}{quantity}", self.block_index));
    }

    pub fn block_index(&self) -> u32 {
        self.block_index
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hex encoded double SHA-256 of the previous ledger hash followed by
    /// every entry in order.
    #[must_use]
    pub fn hash(&self, previous: Option<&str>) -> String {
        let mut text = previous.unwrap_or_default().to_owned();

        for entry in &self.entries {
            text.push_str(entry);
        }

        hex::encode(dhash(text.as_bytes()))
    }
}
