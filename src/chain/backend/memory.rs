// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::chain::{LedgerBackend, LedgerBackendErr, LedgerBatch, LedgerSnapshot};
use crate::primitives::{
    AssetId, AssetRow, Balance, Burn, CreditRecord, DebitRecord, Destruction, Dividend, Escrow,
    EscrowKey, Issuance,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryState {
    balances: BTreeMap<(AssetId, String), u64>,
    assets_by_name: HashMap<String, AssetId>,
    assets: BTreeMap<AssetId, AssetRow>,
    issuances: Vec<Issuance>,
    destructions: Vec<Destruction>,
    burns: Vec<Burn>,
    dividends: Vec<Dividend>,
    debits: Vec<DebitRecord>,
    credits: Vec<CreditRecord>,
    escrows: BTreeMap<EscrowKey, Escrow>,
    last_block: Option<u32>,
}

/// Backend keeping all state in memory. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerBackend for MemoryBackend {
    fn get_balance(
        &self,
        address: &str,
        asset: AssetId,
    ) -> Result<Option<u64>, LedgerBackendErr> {
        let state = self.state.read();
        Ok(state.balances.get(&(asset, address.to_owned())).copied())
    }

    fn balances_of_asset(&self, asset: AssetId) -> Result<Vec<Balance>, LedgerBackendErr> {
        let state = self.state.read();
        Ok(state
            .balances
            .range((asset, String::new())..)
            .take_while(|((a, _), _)| *a == asset)
            .map(|((asset, address), quantity)| Balance {
                address: address.clone(),
                asset: *asset,
                quantity: *quantity,
            })
            .collect())
    }

    fn balances_of_address(&self, address: &str) -> Result<Vec<Balance>, LedgerBackendErr> {
        Ok(self
            .all_balances()?
            .into_iter()
            .filter(|b| b.address == address)
            .collect())
    }

    fn all_balances(&self) -> Result<Vec<Balance>, LedgerBackendErr> {
        let state = self.state.read();
        Ok(state
            .balances
            .iter()
            .map(|((asset, address), quantity)| Balance {
                address: address.clone(),
                asset: *asset,
                quantity: *quantity,
            })
            .collect())
    }

    fn asset_by_name(&self, name: &str) -> Result<Option<AssetRow>, LedgerBackendErr> {
        let state = self.state.read();
        Ok(state
            .assets_by_name
            .get(name)
            .and_then(|id| state.assets.get(id))
            .cloned())
    }

    fn asset_by_id(&self, id: AssetId) -> Result<Option<AssetRow>, LedgerBackendErr> {
        Ok(self.state.read().assets.get(&id).cloned())
    }

    fn issuances(&self) -> Result<Vec<Issuance>, LedgerBackendErr> {
        Ok(self.state.read().issuances.clone())
    }

    fn destructions(&self) -> Result<Vec<Destruction>, LedgerBackendErr> {
        Ok(self.state.read().destructions.clone())
    }

    fn burns(&self) -> Result<Vec<Burn>, LedgerBackendErr> {
        Ok(self.state.read().burns.clone())
    }

    fn dividends(&self) -> Result<Vec<Dividend>, LedgerBackendErr> {
        Ok(self.state.read().dividends.clone())
    }

    fn debits(&self) -> Result<Vec<DebitRecord>, LedgerBackendErr> {
        Ok(self.state.read().debits.clone())
    }

    fn credits(&self) -> Result<Vec<CreditRecord>, LedgerBackendErr> {
        Ok(self.state.read().credits.clone())
    }

    fn escrow(&self, key: &EscrowKey) -> Result<Option<Escrow>, LedgerBackendErr> {
        Ok(self.state.read().escrows.get(key).cloned())
    }

    fn escrows(&self) -> Result<Vec<Escrow>, LedgerBackendErr> {
        Ok(self.state.read().escrows.values().cloned().collect())
    }

    fn last_block(&self) -> Result<Option<u32>, LedgerBackendErr> {
        Ok(self.state.read().last_block)
    }

    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerBackendErr> {
        let state = self.state.read();
        Ok(LedgerSnapshot {
            last_block: state.last_block,
            balances: state
                .balances
                .iter()
                .map(|((asset, address), quantity)| Balance {
                    address: address.clone(),
                    asset: *asset,
                    quantity: *quantity,
                })
                .collect(),
            escrows: state.escrows.values().cloned().collect(),
            issuances: state.issuances.clone(),
            destructions: state.destructions.clone(),
            burns: state.burns.clone(),
            dividends: state.dividends.clone(),
        })
    }

    fn first_valid_issuance(&self, asset: AssetId) -> Result<Option<Issuance>, LedgerBackendErr> {
        let state = self.state.read();
        Ok(state
            .issuances
            .iter()
            .find(|i| i.asset == asset && i.status.is_valid())
            .cloned())
    }

    fn commit(&self, batch: LedgerBatch) -> Result<(), LedgerBackendErr> {
        // Single write guard for the whole batch
        let mut state = self.state.write();

        for ((address, asset), quantity) in batch.balances {
            state.balances.insert((asset, address), quantity);
        }

        for row in batch.assets {
            state
                .assets_by_name
                .insert(row.asset_name.clone(), row.asset_id);
            state.assets.insert(row.asset_id, row);
        }

        for (key, escrow) in batch.escrows {
            match escrow {
                Some(escrow) => {
                    state.escrows.insert(key, escrow);
                }
                None => {
                    state.escrows.remove(&key);
                }
            }
        }

        state.debits.extend(batch.debits);
        state.credits.extend(batch.credits);
        state.issuances.extend(batch.issuances);
        state.destructions.extend(batch.destructions);
        state.burns.extend(batch.burns);
        state.dividends.extend(batch.dividends);
        state.last_block = Some(batch.block_index);

        Ok(())
    }
}
