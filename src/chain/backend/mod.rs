// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{
    AssetId, AssetRow, Balance, Burn, CreditRecord, DebitRecord, Destruction, Dividend, Escrow,
    EscrowKey, Issuance,
};
use bincode::error::DecodeError as BincodeDecodeErr;
use bincode::error::EncodeError as BincodeEncodeErr;
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "disk")]
use crate::chain::backend::disk::DB;
#[cfg(feature = "disk")]
use rocksdb::Error as RocksDBErr;
#[cfg(feature = "disk")]
use rocksdb::{ColumnFamilyDescriptor, LogLevel, Options, TransactionDBOptions};
#[cfg(feature = "disk")]
use std::path::PathBuf;
#[cfg(feature = "disk")]
use std::sync::Arc;

/// Storage interface of the ledger. Reads only ever observe committed
/// state. Writes happen exclusively through [`LedgerBackend::commit`].
pub trait LedgerBackend: Sized + Clone + Send + Sync {
    /// Returns the balance of the address in the given asset if a row exists
    fn get_balance(&self, address: &str, asset: AssetId)
        -> Result<Option<u64>, LedgerBackendErr>;

    /// Returns all balance rows of the asset
    fn balances_of_asset(&self, asset: AssetId) -> Result<Vec<Balance>, LedgerBackendErr>;

    /// Returns all balance rows of the address
    fn balances_of_address(&self, address: &str) -> Result<Vec<Balance>, LedgerBackendErr>;

    /// Returns every balance row
    fn all_balances(&self) -> Result<Vec<Balance>, LedgerBackendErr>;

    /// Looks up the asset table by name
    fn asset_by_name(&self, name: &str) -> Result<Option<AssetRow>, LedgerBackendErr>;

    /// Looks up the asset table by id
    fn asset_by_id(&self, id: AssetId) -> Result<Option<AssetRow>, LedgerBackendErr>;

    /// Issuances in insertion order
    fn issuances(&self) -> Result<Vec<Issuance>, LedgerBackendErr>;

    /// Destructions in insertion order
    fn destructions(&self) -> Result<Vec<Destruction>, LedgerBackendErr>;

    /// Burns in insertion order
    fn burns(&self) -> Result<Vec<Burn>, LedgerBackendErr>;

    /// Dividends in insertion order
    fn dividends(&self) -> Result<Vec<Dividend>, LedgerBackendErr>;

    /// Debit records in insertion order
    fn debits(&self) -> Result<Vec<DebitRecord>, LedgerBackendErr>;

    /// Credit records in insertion order
    fn credits(&self) -> Result<Vec<CreditRecord>, LedgerBackendErr>;

    fn escrow(&self, key: &EscrowKey) -> Result<Option<Escrow>, LedgerBackendErr>;

    /// Returns all open escrows ordered by key
    fn escrows(&self) -> Result<Vec<Escrow>, LedgerBackendErr>;

    /// Returns the height of the last committed block
    fn last_block(&self) -> Result<Option<u32>, LedgerBackendErr>;

    /// Reads balances, escrows and the supply records from a single
    /// committed state.
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerBackendErr>;

    /// Atomically applies a batch. Either every write in the batch is
    /// visible to readers afterwards or none is.
    fn commit(&self, batch: LedgerBatch) -> Result<(), LedgerBackendErr>;

    /// Returns the first valid issuance of the asset
    fn first_valid_issuance(&self, asset: AssetId) -> Result<Option<Issuance>, LedgerBackendErr> {
        Ok(self
            .issuances()?
            .into_iter()
            .find(|i| i.asset == asset && i.status.is_valid()))
    }

    /// Returns the open escrows holding the asset
    fn escrows_of_asset(&self, asset: AssetId) -> Result<Vec<Escrow>, LedgerBackendErr> {
        Ok(self
            .escrows()?
            .into_iter()
            .filter(|e| e.key.asset == asset)
            .collect())
    }
}

/// Committed state needed to account for supplies. Every field is read
/// from the same commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    pub last_block: Option<u32>,
    pub balances: Vec<Balance>,

    /// Open escrows ordered by key
    pub escrows: Vec<Escrow>,
    pub issuances: Vec<Issuance>,
    pub destructions: Vec<Destruction>,
    pub burns: Vec<Burn>,
    pub dividends: Vec<Dividend>,
}

/// Writes produced by one block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerBatch {
    pub block_index: u32,

    /// Final value of every balance touched in the block
    pub balances: BTreeMap<(String, AssetId), u64>,
    pub debits: Vec<DebitRecord>,
    pub credits: Vec<CreditRecord>,
    pub assets: Vec<AssetRow>,
    pub issuances: Vec<Issuance>,
    pub destructions: Vec<Destruction>,
    pub burns: Vec<Burn>,
    pub dividends: Vec<Dividend>,

    /// `None` removes the escrow
    pub escrows: BTreeMap<EscrowKey, Option<Escrow>>,
}

impl LedgerBatch {
    #[must_use]
    pub fn new(block_index: u32) -> Self {
        Self {
            block_index,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
            && self.debits.is_empty()
            && self.credits.is_empty()
            && self.assets.is_empty()
            && self.issuances.is_empty()
            && self.destructions.is_empty()
            && self.burns.is_empty()
            && self.dividends.is_empty()
            && self.escrows.is_empty()
    }
}

#[derive(Debug)]
pub enum LedgerBackendErr {
    /// Backend data is corrupted
    CorruptData,

    /// Rocksdb error
    #[cfg(feature = "disk")]
    RocksDB(RocksDBErr),

    /// Bincode encode error
    BincodeEncode(BincodeEncodeErr),

    /// Bincode decode error
    BincodeDecode(BincodeDecodeErr),

    /// Generic error
    Error(&'static str),
}

impl fmt::Display for LedgerBackendErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptData => write!(f, "backend data is corrupted"),
            #[cfg(feature = "disk")]
            Self::RocksDB(err) => write!(f, "rocksdb error: {err}"),
            Self::BincodeEncode(err) => write!(f, "encode error: {err}"),
            Self::BincodeDecode(err) => write!(f, "decode error: {err}"),
            Self::Error(err) => f.write_str(err),
        }
    }
}

impl std::error::Error for LedgerBackendErr {}

#[cfg(feature = "disk")]
impl From<RocksDBErr> for LedgerBackendErr {
    fn from(other: RocksDBErr) -> Self {
        Self::RocksDB(other)
    }
}

impl From<BincodeEncodeErr> for LedgerBackendErr {
    fn from(other: BincodeEncodeErr) -> Self {
        Self::BincodeEncode(other)
    }
}

impl From<BincodeDecodeErr> for LedgerBackendErr {
    fn from(other: BincodeDecodeErr) -> Self {
        Self::BincodeDecode(other)
    }
}

/// Opens the ledger database under the configured data dir.
#[cfg(feature = "disk")]
pub fn create_rocksdb_backend() -> Result<Arc<DB>, LedgerBackendErr> {
    #[cfg(not(test))]
    let mut path = PathBuf::from(&crate::settings::SETTINGS.node.data_dir);

    #[cfg(test)]
    let mut path = {
        use rand::Rng;
        let mut path = std::env::temp_dir();
        path.push(hex::encode(rand::thread_rng().gen::<[u8; 32]>()));
        path.push("Tokenlayer");
        path
    };

    path.push(&crate::settings::SETTINGS.node.network_name);
    path.push("data");

    open_rocksdb(path)
}

#[cfg(feature = "disk")]
pub fn open_rocksdb(path: PathBuf) -> Result<Arc<DB>, LedgerBackendErr> {
    let mut cf_opts = Options::default();
    cf_opts.set_max_write_buffer_number(3);
    let cfs: Vec<_> = crate::chain::backend::disk::COLUMN_FAMILIES
        .iter()
        .map(|name| ColumnFamilyDescriptor::new(*name, cf_opts.clone()))
        .collect();

    let mut db_opts = Options::default();
    db_opts.create_missing_column_families(true);
    db_opts.create_if_missing(true);
    db_opts.set_log_level(LogLevel::Warn);
    db_opts.set_keep_log_file_num(1);
    let db = DB::open_cf_descriptors(&db_opts, &TransactionDBOptions::default(), path, cfs)?;
    Ok(Arc::new(db))
}

#[cfg(feature = "disk")]
pub mod disk;
pub mod memory;
