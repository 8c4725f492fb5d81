// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Balance ledger.
//!
//! A [`LedgerStore`] hands out at most one [`BlockTxn`] at a time. All
//! mutations of a block are staged in the transaction, where reads observe
//! them, and reach the backend in a single atomic commit. Dropping the
//! transaction without committing discards the block.

mod block_ledger;
mod event;

pub use block_ledger::*;
pub use event::*;

use crate::chain::{LedgerBackend, LedgerBackendErr, LedgerBatch};
use crate::consensus::*;
use crate::primitives::{
    self, Action, AssetErr, AssetId, AssetLookup, AssetRow, Balance, Burn, CreditRecord,
    DebitRecord, Destruction, Dividend, Escrow, EscrowKey, Issuance,
};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::mem;
use std::sync::Arc;

#[derive(Debug)]
pub enum LedgerErr {
    /// Quantity above the balance ceiling
    InvalidQuantity(u64),

    /// Asset cannot be held by the address
    AssetRestricted { address: String, asset: AssetId },

    /// Debit larger than the balance
    InsufficientFunds {
        address: String,
        asset: AssetId,
        balance: u64,
        quantity: u64,
    },

    /// Escrow does not exist
    UnknownEscrow(EscrowKey),

    /// Escrow already exists
    DuplicateEscrow(EscrowKey),

    /// Backend error
    Backend(LedgerBackendErr),

    /// Asset codec error
    Asset(AssetErr),
}

impl fmt::Display for LedgerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuantity(quantity) => write!(f, "invalid quantity: {quantity}"),
            Self::AssetRestricted { address, asset } => {
                write!(f, "asset {asset} cannot be held by {address}")
            }
            Self::InsufficientFunds {
                address,
                asset,
                balance,
                quantity,
            } => write!(
                f,
                "insufficient funds: {address} holds {balance} of asset {asset}, needs {quantity}"
            ),
            Self::UnknownEscrow(key) => write!(f, "unknown escrow: {key}"),
            Self::DuplicateEscrow(key) => write!(f, "duplicate escrow: {key}"),
            Self::Backend(err) => write!(f, "backend error: {err}"),
            Self::Asset(err) => write!(f, "asset error: {err}"),
        }
    }
}

impl std::error::Error for LedgerErr {}

impl From<LedgerBackendErr> for LedgerErr {
    fn from(other: LedgerBackendErr) -> Self {
        Self::Backend(other)
    }
}

impl From<AssetErr> for LedgerErr {
    fn from(other: AssetErr) -> Self {
        Self::Asset(other)
    }
}

/// Ledger over a backend. Share it behind an `Arc`, readers may query it
/// concurrently with the block writer.
pub struct LedgerStore<B: LedgerBackend> {
    backend: B,
    gate: Arc<ProtocolGate>,
    writer: Mutex<()>,
}

impl<B: LedgerBackend> LedgerStore<B> {
    pub fn new(backend: B, gate: Arc<ProtocolGate>) -> Self {
        Self {
            backend,
            gate,
            writer: Mutex::new(()),
        }
    }

    /// Opens the transaction of a block, waiting for the previous block
    /// transaction to finish.
    pub fn begin_block(&self, block_index: u32) -> BlockTxn<'_, B> {
        let guard = self.writer.lock();
        BlockTxn::new(self, guard, block_index)
    }

    /// Opens the transaction of a block if no other block is open.
    pub fn try_begin_block(&self, block_index: u32) -> Option<BlockTxn<'_, B>> {
        let guard = self.writer.try_lock()?;
        Some(BlockTxn::new(self, guard, block_index))
    }

    /// Committed balance, absent rows are zero.
    pub fn get_balance(&self, address: &str, asset: AssetId) -> Result<u64, LedgerErr> {
        Ok(self.backend.get_balance(address, asset)?.unwrap_or(0))
    }

    pub fn balances(&self, address: &str) -> Result<Vec<Balance>, LedgerErr> {
        Ok(self.backend.balances_of_address(address)?)
    }

    pub fn get_asset_id(&self, name: &str, height: u32) -> Result<AssetId, LedgerErr> {
        Ok(primitives::get_asset_id(
            &self.backend,
            name,
            height,
            &self.gate,
        )?)
    }

    pub fn get_asset_name(&self, id: AssetId, height: u32) -> Result<String, LedgerErr> {
        Ok(primitives::get_asset_name(
            &self.backend,
            id,
            height,
            &self.gate,
        )?)
    }

    pub fn is_divisible(&self, id: AssetId) -> Result<bool, LedgerErr> {
        Ok(primitives::is_divisible(&self.backend, id)?)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn gate(&self) -> &ProtocolGate {
        &self.gate
    }
}

/// Staged mutations of one block. Holds the ledger write lock until it is
/// committed or dropped.
pub struct BlockTxn<'a, B: LedgerBackend> {
    store: &'a LedgerStore<B>,
    batch: LedgerBatch,
    ledger: BlockLedger,
    committed: bool,
    _writer: MutexGuard<'a, ()>,
}

impl<'a, B: LedgerBackend> BlockTxn<'a, B> {
    fn new(store: &'a LedgerStore<B>, writer: MutexGuard<'a, ()>, block_index: u32) -> Self {
        Self {
            store,
            batch: LedgerBatch::new(block_index),
            ledger: BlockLedger::new(block_index),
            committed: false,
            _writer: writer,
        }
    }

    pub fn block_index(&self) -> u32 {
        self.batch.block_index
    }

    /// Audit trail of the mutations staged so far
    pub fn ledger(&self) -> &BlockLedger {
        &self.ledger
    }

    fn balance_row(&self, address: &str, asset: AssetId) -> Result<Option<u64>, LedgerErr> {
        if let Some(quantity) = self.batch.balances.get(&(address.to_owned(), asset)) {
            return Ok(Some(*quantity));
        }

        Ok(self.store.backend.get_balance(address, asset)?)
    }

    /// Balance including the mutations staged in this block
    pub fn get_balance(&self, address: &str, asset: AssetId) -> Result<u64, LedgerErr> {
        Ok(self.balance_row(address, asset)?.unwrap_or(0))
    }

    pub fn escrow(&self, key: &EscrowKey) -> Result<Option<Escrow>, LedgerErr> {
        if let Some(staged) = self.batch.escrows.get(key) {
            return Ok(staged.clone());
        }

        Ok(self.store.backend.escrow(key)?)
    }

    /// Guards shared by every balance mutation
    fn check(&self, address: &str, asset: AssetId, quantity: u64) -> Result<(), LedgerErr> {
        if !quantity_check(quantity) {
            return Err(LedgerErr::InvalidQuantity(quantity));
        }

        let restricted = asset == BTC_ID
            || (self.store.gate.enabled(
                ProtocolChange::ContractsOnlyXcpBalances,
                self.block_index(),
            ) && is_contract_address(address)
                && asset != XCP_ID);

        if restricted {
            return Err(LedgerErr::AssetRestricted {
                address: address.to_owned(),
                asset,
            });
        }

        Ok(())
    }

    fn check_funds(&self, address: &str, asset: AssetId, quantity: u64) -> Result<(), LedgerErr> {
        let balance = self.get_balance(address, asset)?;

        if balance < quantity {
            return Err(LedgerErr::InsufficientFunds {
                address: address.to_owned(),
                asset,
                balance,
                quantity,
            });
        }

        Ok(())
    }

    fn apply_debit(
        &mut self,
        address: &str,
        asset: AssetId,
        quantity: u64,
        action: Action,
        event: &str,
    ) -> Result<(), LedgerErr> {
        // A zero debit of a missing row creates no row
        if let Some(balance) = self.balance_row(address, asset)? {
            debug_assert!(balance >= quantity);
            self.batch
                .balances
                .insert((address.to_owned(), asset), balance - quantity);
        }

        let record = DebitRecord {
            block_index: self.block_index(),
            address: address.to_owned(),
            asset,
            quantity,
            action,
            event: event.to_owned(),
        };

        LedgerEvent::Debit {
            block_index: record.block_index,
            address,
            asset,
            quantity,
            action: &record.action,
            event,
        }
        .log();

        self.batch.debits.push(record);
        self.ledger.push(address, asset, quantity);
        Ok(())
    }

    fn apply_credit(
        &mut self,
        address: &str,
        asset: AssetId,
        quantity: u64,
        action: Action,
        event: &str,
    ) -> Result<(), LedgerErr> {
        let balance = self.get_balance(address, asset)?;
        let balance = balance.saturating_add(quantity).min(MAX_INT);
        self.batch
            .balances
            .insert((address.to_owned(), asset), balance);

        let record = CreditRecord {
            block_index: self.block_index(),
            address: address.to_owned(),
            asset,
            quantity,
            action,
            event: event.to_owned(),
        };

        LedgerEvent::Credit {
            block_index: record.block_index,
            address,
            asset,
            quantity,
            action: &record.action,
            event,
        }
        .log();

        self.batch.credits.push(record);
        self.ledger.push(address, asset, quantity);
        Ok(())
    }

    pub fn debit(
        &mut self,
        address: &str,
        asset: AssetId,
        quantity: u64,
        action: Action,
        event: &str,
    ) -> Result<(), LedgerErr> {
        self.check(address, asset, quantity)?;
        self.check_funds(address, asset, quantity)?;
        self.apply_debit(address, asset, quantity, action, event)
    }

    /// Credits saturate at [`MAX_INT`].
    pub fn credit(
        &mut self,
        address: &str,
        asset: AssetId,
        quantity: u64,
        action: Action,
        event: &str,
    ) -> Result<(), LedgerErr> {
        self.check(address, asset, quantity)?;
        self.apply_credit(address, asset, quantity, action, event)
    }

    /// Debit followed by credit. Nothing is staged if either side fails
    /// its checks.
    pub fn transfer(
        &mut self,
        source: &str,
        destination: &str,
        asset: AssetId,
        quantity: u64,
        action: Action,
        event: &str,
    ) -> Result<(), LedgerErr> {
        self.check(source, asset, quantity)?;
        self.check(destination, asset, quantity)?;
        self.check_funds(source, asset, quantity)?;
        self.apply_debit(source, asset, quantity, action.clone(), event)?;
        self.apply_credit(destination, asset, quantity, action, event)
    }

    fn asset_row(&self, id: AssetId) -> Result<Option<AssetRow>, LedgerErr> {
        if let Some(row) = self.batch.assets.iter().find(|r| r.asset_id == id) {
            return Ok(Some(row.clone()));
        }

        Ok(self.store.backend.asset_by_id(id)?)
    }

    /// Records an issuance. A valid issuance pays its fee, credits the
    /// issuer and registers the asset name on first issue.
    pub fn record_issuance(
        &mut self,
        issuance: Issuance,
        asset_name: &str,
    ) -> Result<(), LedgerErr> {
        if issuance.status.is_valid() {
            self.check(&issuance.source, XCP_ID, issuance.fee_paid)?;
            self.check(&issuance.issuer, issuance.asset, issuance.quantity)?;
            self.check_funds(&issuance.source, XCP_ID, issuance.fee_paid)?;

            if issuance.fee_paid > 0 {
                self.apply_debit(
                    &issuance.source,
                    XCP_ID,
                    issuance.fee_paid,
                    Action::IssuanceFee,
                    &issuance.tx_hash,
                )?;
            }

            let name_taken = self.asset_id_by_name(asset_name)?.is_some();
            if self.asset_row(issuance.asset)?.is_none() && !name_taken {
                let row = AssetRow {
                    asset_id: issuance.asset,
                    asset_name: asset_name.to_owned(),
                    block_index: self.block_index(),
                };

                LedgerEvent::AssetRegistered {
                    block_index: row.block_index,
                    asset: row.asset_id,
                    name: &row.asset_name,
                }
                .log();

                self.batch.assets.push(row);
            }

            self.apply_credit(
                &issuance.issuer,
                issuance.asset,
                issuance.quantity,
                Action::Issuance,
                &issuance.tx_hash,
            )?;
        }

        LedgerEvent::Recorded {
            table: "issuance",
            tx_hash: &issuance.tx_hash,
            status: &issuance.status,
        }
        .log();

        self.batch.issuances.push(issuance);
        Ok(())
    }

    /// Records a destruction, debiting the source when valid.
    pub fn record_destruction(&mut self, destruction: Destruction) -> Result<(), LedgerErr> {
        if destruction.status.is_valid() {
            self.debit(
                &destruction.source,
                destruction.asset,
                destruction.quantity,
                Action::Destroy,
                &destruction.tx_hash,
            )?;
        }

        LedgerEvent::Recorded {
            table: "destruction",
            tx_hash: &destruction.tx_hash,
            status: &destruction.status,
        }
        .log();

        self.batch.destructions.push(destruction);
        Ok(())
    }

    /// Records a burn, crediting the earned XCP when valid.
    pub fn record_burn(&mut self, burn: Burn) -> Result<(), LedgerErr> {
        if burn.status.is_valid() {
            self.credit(
                &burn.source,
                XCP_ID,
                burn.earned,
                Action::Burn,
                &burn.tx_hash,
            )?;
        }

        LedgerEvent::Recorded {
            table: "burn",
            tx_hash: &burn.tx_hash,
            status: &burn.status,
        }
        .log();

        self.batch.burns.push(burn);
        Ok(())
    }

    /// Records a dividend. A valid dividend moves the payouts from the
    /// source to the holders and pays the fee.
    pub fn record_dividend(
        &mut self,
        dividend: Dividend,
        payouts: &[(String, u64)],
    ) -> Result<(), LedgerErr> {
        if dividend.status.is_valid() {
            let total = payouts
                .iter()
                .try_fold(0u64, |acc, (_, q)| acc.checked_add(*q))
                .ok_or(LedgerErr::InvalidQuantity(u64::MAX))?;

            self.check(&dividend.source, dividend.dividend_asset, total)?;
            self.check(&dividend.source, XCP_ID, dividend.fee_paid)?;
            for (holder, quantity) in payouts {
                self.check(holder, dividend.dividend_asset, *quantity)?;
            }

            if dividend.dividend_asset == XCP_ID {
                let needed = total
                    .checked_add(dividend.fee_paid)
                    .ok_or(LedgerErr::InvalidQuantity(u64::MAX))?;
                self.check_funds(&dividend.source, XCP_ID, needed)?;
            } else {
                self.check_funds(&dividend.source, dividend.dividend_asset, total)?;
                self.check_funds(&dividend.source, XCP_ID, dividend.fee_paid)?;
            }

            self.apply_debit(
                &dividend.source,
                dividend.dividend_asset,
                total,
                Action::Dividend,
                &dividend.tx_hash,
            )?;

            for (holder, quantity) in payouts {
                self.apply_credit(
                    holder,
                    dividend.dividend_asset,
                    *quantity,
                    Action::Dividend,
                    &dividend.tx_hash,
                )?;
            }

            if dividend.fee_paid > 0 {
                self.apply_debit(
                    &dividend.source,
                    XCP_ID,
                    dividend.fee_paid,
                    Action::DividendFee,
                    &dividend.tx_hash,
                )?;
            }
        }

        LedgerEvent::Recorded {
            table: "dividend",
            tx_hash: &dividend.tx_hash,
            status: &dividend.status,
        }
        .log();

        self.batch.dividends.push(dividend);
        Ok(())
    }

    /// Moves funds from the address into a new escrow.
    pub fn lock_escrow(&mut self, escrow: Escrow, event: &str) -> Result<(), LedgerErr> {
        let key = &escrow.key;

        if self.escrow(key)?.is_some() {
            return Err(LedgerErr::DuplicateEscrow(key.clone()));
        }

        self.debit(
            &key.address,
            key.asset,
            escrow.quantity,
            Action::Escrow,
            event,
        )?;

        LedgerEvent::EscrowLocked {
            key,
            kind: escrow.kind,
            quantity: escrow.quantity,
        }
        .log();

        self.batch.escrows.insert(key.clone(), Some(escrow));
        Ok(())
    }

    /// Removes an escrow and credits its funds to the destination. Returns
    /// the released quantity.
    pub fn release_escrow(
        &mut self,
        key: &EscrowKey,
        destination: &str,
        event: &str,
    ) -> Result<u64, LedgerErr> {
        let escrow = self
            .escrow(key)?
            .ok_or_else(|| LedgerErr::UnknownEscrow(key.clone()))?;

        self.credit(
            destination,
            key.asset,
            escrow.quantity,
            Action::EscrowRelease,
            event,
        )?;

        LedgerEvent::EscrowReleased {
            key,
            destination,
            quantity: escrow.quantity,
        }
        .log();

        self.batch.escrows.insert(key.clone(), None);
        Ok(escrow.quantity)
    }

    pub fn get_asset_id(&self, name: &str) -> Result<AssetId, LedgerErr> {
        Ok(primitives::get_asset_id(
            self,
            name,
            self.block_index(),
            &self.store.gate,
        )?)
    }

    pub fn get_asset_name(&self, id: AssetId) -> Result<String, LedgerErr> {
        Ok(primitives::get_asset_name(
            self,
            id,
            self.block_index(),
            &self.store.gate,
        )?)
    }

    pub fn is_divisible(&self, id: AssetId) -> Result<bool, LedgerErr> {
        Ok(primitives::is_divisible(self, id)?)
    }

    /// Applies the block to the backend and returns its audit trail.
    pub fn commit(mut self) -> Result<BlockLedger, LedgerErr> {
        let block_index = self.block_index();
        let batch = mem::replace(&mut self.batch, LedgerBatch::new(block_index));
        self.store.backend.commit(batch)?;
        self.committed = true;

        let ledger = mem::replace(&mut self.ledger, BlockLedger::new(block_index));

        LedgerEvent::Committed {
            block_index,
            mutations: ledger.len(),
        }
        .log();

        Ok(ledger)
    }
}

impl<B: LedgerBackend> AssetLookup for BlockTxn<'_, B> {
    fn asset_id_by_name(&self, name: &str) -> Result<Option<AssetId>, LedgerBackendErr> {
        if let Some(row) = self.batch.assets.iter().find(|r| r.asset_name == name) {
            return Ok(Some(row.asset_id));
        }

        Ok(self.store.backend.asset_by_name(name)?.map(|r| r.asset_id))
    }

    fn asset_name_by_id(&self, id: AssetId) -> Result<Option<String>, LedgerBackendErr> {
        if let Some(row) = self.batch.assets.iter().find(|r| r.asset_id == id) {
            return Ok(Some(row.asset_name.clone()));
        }

        Ok(self.store.backend.asset_by_id(id)?.map(|r| r.asset_name))
    }

    fn asset_divisibility(&self, id: AssetId) -> Result<Option<bool>, LedgerBackendErr> {
        if let Some(issuance) = self.store.backend.first_valid_issuance(id)? {
            return Ok(Some(issuance.divisible));
        }

        Ok(self
            .batch
            .issuances
            .iter()
            .find(|i| i.asset == id && i.status.is_valid())
            .map(|i| i.divisible))
    }
}

impl<B: LedgerBackend> Drop for BlockTxn<'_, B> {
    fn drop(&mut self) {
        if !self.committed && !self.batch.is_empty() {
            LedgerEvent::RolledBack {
                block_index: self.block_index(),
                mutations: self.ledger.len(),
            }
            .log();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{MemoryBackend, Network};
    use crate::primitives::{EscrowKind, RecordStatus};
    use quickcheck::*;
    use std::thread;

    const ALICE: &str = "1AGNa15ZQXAZUgFiqJ2i7Z2DPU2J6hW62i";
    const BOB: &str = "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2";
    const BAAA: AssetId = 17_576;

    fn store(network: Network) -> LedgerStore<MemoryBackend> {
        let gate = ProtocolGate::with_default_changes(network).unwrap();
        LedgerStore::new(MemoryBackend::new(), Arc::new(gate))
    }

    fn funded(network: Network, address: &str, asset: AssetId, quantity: u64) -> LedgerStore<MemoryBackend> {
        let store = store(network);
        let mut txn = store.begin_block(1);
        txn.credit(address, asset, quantity, Action::Send, "genesis").unwrap();
        txn.commit().unwrap();
        store
    }

    fn issuance(asset: AssetId, quantity: u64, fee_paid: u64) -> Issuance {
        Issuance {
            tx_index: 0,
            tx_hash: "issue".to_owned(),
            block_index: 2,
            asset,
            quantity,
            divisible: true,
            source: ALICE.to_owned(),
            issuer: ALICE.to_owned(),
            transfer: false,
            locked: false,
            description: "test asset".to_owned(),
            fee_paid,
            status: RecordStatus::Valid,
        }
    }

    #[test]
    fn it_debits_and_credits() {
        let store = funded(Network::Testnet, ALICE, XCP_ID, 100);
        let mut txn = store.begin_block(2);
        txn.debit(ALICE, XCP_ID, 30, Action::Send, "tx").unwrap();
        txn.credit(BOB, XCP_ID, 30, Action::Send, "tx").unwrap();
        assert_eq!(txn.get_balance(ALICE, XCP_ID).unwrap(), 70);
        // Not visible before commit
        assert_eq!(store.get_balance(ALICE, XCP_ID).unwrap(), 100);
        txn.commit().unwrap();

        assert_eq!(store.get_balance(ALICE, XCP_ID).unwrap(), 70);
        assert_eq!(store.get_balance(BOB, XCP_ID).unwrap(), 30);
        assert_eq!(store.backend().debits().unwrap().len(), 1);
        assert_eq!(store.backend().credits().unwrap().len(), 2);
    }

    #[test]
    fn it_rejects_overdraft() {
        let store = funded(Network::Testnet, ALICE, XCP_ID, 10);
        let mut txn = store.begin_block(2);
        assert!(matches!(
            txn.debit(ALICE, XCP_ID, 11, Action::Send, "tx"),
            Err(LedgerErr::InsufficientFunds { balance: 10, quantity: 11, .. })
        ));
        assert!(matches!(
            txn.debit(BOB, XCP_ID, 1, Action::Send, "tx"),
            Err(LedgerErr::InsufficientFunds { balance: 0, .. })
        ));
        assert!(txn.ledger().is_empty());
    }

    #[test]
    fn it_rejects_quantities_above_ceiling() {
        let store = store(Network::Testnet);
        let mut txn = store.begin_block(1);
        assert!(matches!(
            txn.credit(ALICE, XCP_ID, MAX_INT + 1, Action::Send, "tx"),
            Err(LedgerErr::InvalidQuantity(_))
        ));
        assert!(matches!(
            txn.debit(ALICE, XCP_ID, u64::MAX, Action::Send, "tx"),
            Err(LedgerErr::InvalidQuantity(_))
        ));
    }

    #[test]
    fn it_saturates_credits() {
        let store = funded(Network::Testnet, ALICE, XCP_ID, MAX_INT - 5);
        let mut txn = store.begin_block(2);
        txn.credit(ALICE, XCP_ID, 10, Action::Send, "tx").unwrap();
        txn.credit(ALICE, XCP_ID, MAX_INT, Action::Send, "tx").unwrap();
        assert_eq!(txn.get_balance(ALICE, XCP_ID).unwrap(), MAX_INT);
        // Records keep the requested quantity
        txn.commit().unwrap();
        let credits = store.backend().credits().unwrap();
        assert_eq!(credits.last().unwrap().quantity, MAX_INT);
    }

    #[test]
    fn it_never_tracks_btc() {
        let store = store(Network::Testnet);
        let mut txn = store.begin_block(1);
        assert!(matches!(
            txn.credit(ALICE, BTC_ID, 1, Action::Send, "tx"),
            Err(LedgerErr::AssetRestricted { .. })
        ));
        assert!(matches!(
            txn.debit(ALICE, BTC_ID, 0, Action::Send, "tx"),
            Err(LedgerErr::AssetRestricted { .. })
        ));
    }

    #[test]
    fn it_restricts_contract_balances_once_active() {
        let contract = "a".repeat(CONTRACT_ADDRESS_LEN);
        let store = store(Network::Mainnet);
        let activation = store
            .gate()
            .activation_height(ProtocolChange::ContractsOnlyXcpBalances);

        let mut txn = store.begin_block(activation - 1);
        txn.credit(&contract, BAAA, 5, Action::Send, "tx").unwrap();
        txn.commit().unwrap();

        let mut txn = store.begin_block(activation);
        assert!(matches!(
            txn.credit(&contract, BAAA, 5, Action::Send, "tx"),
            Err(LedgerErr::AssetRestricted { .. })
        ));
        txn.credit(&contract, XCP_ID, 5, Action::Send, "tx").unwrap();
        txn.credit(ALICE, BAAA, 5, Action::Send, "tx").unwrap();
    }

    #[test]
    fn it_transfers_atomically() {
        let store = funded(Network::Testnet, ALICE, XCP_ID, 100);
        let mut txn = store.begin_block(2);
        assert!(matches!(
            txn.transfer(ALICE, BOB, XCP_ID, 150, Action::Send, "tx"),
            Err(LedgerErr::InsufficientFunds { .. })
        ));
        assert_eq!(txn.get_balance(ALICE, XCP_ID).unwrap(), 100);
        assert_eq!(txn.get_balance(BOB, XCP_ID).unwrap(), 0);
        assert!(txn.ledger().is_empty());

        // Failing credit side stages nothing either
        let contract = "b".repeat(CONTRACT_ADDRESS_LEN);
        txn.credit(ALICE, BAAA, 10, Action::Send, "tx").unwrap();
        assert!(txn
            .transfer(ALICE, &contract, BAAA, 10, Action::Send, "tx")
            .is_err());
        assert_eq!(txn.get_balance(ALICE, BAAA).unwrap(), 10);

        txn.transfer(ALICE, BOB, XCP_ID, 40, Action::Send, "tx")
            .unwrap();
        let ledger = txn.commit().unwrap();
        assert_eq!(ledger.len(), 3);
        assert_eq!(store.get_balance(ALICE, XCP_ID).unwrap(), 60);
        assert_eq!(store.get_balance(BOB, XCP_ID).unwrap(), 40);
    }

    #[test]
    fn it_rolls_back_on_drop() {
        let store = funded(Network::Testnet, ALICE, XCP_ID, 100);
        {
            let mut txn = store.begin_block(2);
            txn.transfer(ALICE, BOB, XCP_ID, 100, Action::Send, "tx")
                .unwrap();
        }
        assert_eq!(store.get_balance(ALICE, XCP_ID).unwrap(), 100);
        assert_eq!(store.get_balance(BOB, XCP_ID).unwrap(), 0);
        assert_eq!(store.backend().last_block().unwrap(), Some(1));
    }

    #[test]
    fn it_allows_one_writer() {
        let store = store(Network::Testnet);
        let txn = store.begin_block(1);
        assert!(store.try_begin_block(1).is_none());
        drop(txn);
        assert!(store.try_begin_block(1).is_some());
    }

    #[test]
    fn it_records_zero_debit_without_balance_row() {
        let store = store(Network::Testnet);
        let mut txn = store.begin_block(1);
        txn.debit(ALICE, XCP_ID, 0, Action::Send, "tx").unwrap();
        txn.commit().unwrap();
        assert!(store.balances(ALICE).unwrap().is_empty());
        assert_eq!(store.backend().debits().unwrap().len(), 1);
    }

    #[test]
    fn it_writes_block_ledger_entries() {
        let store = funded(Network::Testnet, ALICE, XCP_ID, 100);
        let mut txn = store.begin_block(7);
        txn.transfer(ALICE, BOB, XCP_ID, 5, Action::Send, "tx")
            .unwrap();
        let ledger = txn.commit().unwrap();
        assert_eq!(
            ledger.entries(),
            &[format!("7{ALICE}15"), format!("7{BOB}15")]
        );
    }

    #[test]
    fn it_records_issuances() {
        let store = funded(Network::Testnet, ALICE, XCP_ID, 100);
        let mut txn = store.begin_block(2);
        txn.record_issuance(issuance(BAAA, 1000, 50), "BAAA").unwrap();
        assert_eq!(txn.get_asset_id("BAAA").unwrap(), BAAA);
        assert_eq!(txn.get_asset_name(BAAA).unwrap(), "BAAA");
        assert!(txn.is_divisible(BAAA).unwrap());

        // Reissuance does not register the name twice
        txn.record_issuance(issuance(BAAA, 10, 0), "BAAA").unwrap();
        txn.commit().unwrap();

        assert_eq!(store.get_balance(ALICE, BAAA).unwrap(), 1010);
        assert_eq!(store.get_balance(ALICE, XCP_ID).unwrap(), 50);
        assert_eq!(store.get_asset_id("BAAA", 2).unwrap(), BAAA);
        assert_eq!(store.backend().issuances().unwrap().len(), 2);
    }

    #[test]
    fn it_rejects_unfunded_issuance() {
        let store = funded(Network::Testnet, ALICE, XCP_ID, 10);
        let mut txn = store.begin_block(2);
        assert!(matches!(
            txn.record_issuance(issuance(BAAA, 1000, 50), "BAAA"),
            Err(LedgerErr::InsufficientFunds { .. })
        ));
        assert!(txn.ledger().is_empty());

        let mut invalid = issuance(BAAA, 1000, 50);
        invalid.status = RecordStatus::Invalid("insufficient funds".to_owned());
        txn.record_issuance(invalid, "BAAA").unwrap();
        assert!(txn.ledger().is_empty());
        assert!(matches!(
            txn.get_asset_id("BAAA"),
            Err(LedgerErr::Asset(AssetErr::NoSuchAsset(_)))
        ));
    }

    #[test]
    fn it_records_dividends() {
        let store = funded(Network::Testnet, ALICE, XCP_ID, 1_000);
        let dividend = Dividend {
            tx_index: 1,
            tx_hash: "div".to_owned(),
            block_index: 2,
            source: ALICE.to_owned(),
            asset: BAAA,
            dividend_asset: XCP_ID,
            quantity_per_unit: 1,
            fee_paid: 40,
            status: RecordStatus::Valid,
        };
        let payouts = vec![(BOB.to_owned(), 300), ("carol".to_owned(), 200)];

        let mut txn = store.begin_block(2);
        let mut greedy = dividend.clone();
        greedy.fee_paid = 501;
        assert!(txn.record_dividend(greedy, &payouts).is_err());
        txn.record_dividend(dividend, &payouts).unwrap();
        txn.commit().unwrap();

        assert_eq!(store.get_balance(ALICE, XCP_ID).unwrap(), 460);
        assert_eq!(store.get_balance(BOB, XCP_ID).unwrap(), 300);
        assert_eq!(store.get_balance("carol", XCP_ID).unwrap(), 200);
    }

    #[test]
    fn it_locks_and_releases_escrows() {
        let store = funded(Network::Testnet, ALICE, XCP_ID, 100);
        let key = EscrowKey {
            escrow_id: "order".to_owned(),
            address: ALICE.to_owned(),
            asset: XCP_ID,
        };
        let escrow = Escrow {
            key: key.clone(),
            kind: EscrowKind::Order,
            quantity: 60,
        };

        let mut txn = store.begin_block(2);
        txn.lock_escrow(escrow.clone(), "order").unwrap();
        assert!(matches!(
            txn.lock_escrow(escrow, "order"),
            Err(LedgerErr::DuplicateEscrow(_))
        ));
        assert_eq!(txn.get_balance(ALICE, XCP_ID).unwrap(), 40);
        txn.commit().unwrap();
        assert_eq!(store.backend().escrows().unwrap().len(), 1);

        let mut txn = store.begin_block(3);
        assert_eq!(txn.release_escrow(&key, BOB, "match").unwrap(), 60);
        assert!(matches!(
            txn.release_escrow(&key, BOB, "match"),
            Err(LedgerErr::UnknownEscrow(_))
        ));
        txn.commit().unwrap();
        assert_eq!(store.get_balance(BOB, XCP_ID).unwrap(), 60);
        assert!(store.backend().escrows().unwrap().is_empty());
    }

    #[test]
    fn it_never_exposes_half_applied_blocks() {
        let store = Arc::new(funded(Network::Testnet, ALICE, XCP_ID, 1_000));
        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for height in 2..200 {
                    let mut txn = store.begin_block(height);
                    let (from, to) = if height % 2 == 0 { (ALICE, BOB) } else { (BOB, ALICE) };
                    let balance = txn.get_balance(from, XCP_ID).unwrap();
                    txn.transfer(from, to, XCP_ID, balance, Action::Send, "tx")
                        .unwrap();
                    txn.commit().unwrap();
                }
            })
        };

        for _ in 0..200 {
            let total: u64 = store
                .backend()
                .balances_of_asset(XCP_ID)
                .unwrap()
                .iter()
                .map(|b| b.quantity)
                .sum();
            assert_eq!(total, 1_000);
        }

        writer.join().unwrap();
    }

    quickcheck! {
        fn prop_balances_never_negative(ops: Vec<(bool, u16)>) -> bool {
            let store = store(Network::Testnet);
            let mut txn = store.begin_block(1);
            let mut expected: u64 = 0;

            for (is_credit, quantity) in ops {
                let quantity = u64::from(quantity);
                if is_credit {
                    txn.credit(ALICE, XCP_ID, quantity, Action::Send, "tx").unwrap();
                    expected += quantity;
                } else if txn.debit(ALICE, XCP_ID, quantity, Action::Send, "tx").is_ok() {
                    expected -= quantity;
                } else if quantity <= expected {
                    return false;
                }
            }

            txn.get_balance(ALICE, XCP_ID).unwrap() == expected
        }
    }
}
