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
use bincode::{Decode, Encode};
use rocksdb::{
    BoundColumnFamily, Direction, IteratorMode, MultiThreaded, SnapshotWithThreadMode,
    Transaction, TransactionDB,
};
use std::sync::Arc;

pub type DB = TransactionDB<MultiThreaded>;
type Snapshot<'a> = SnapshotWithThreadMode<'a, DB>;

pub const BALANCES_CF: &str = "balances";
pub const DEBITS_CF: &str = "debits";
pub const CREDITS_CF: &str = "credits";
pub const ASSETS_CF: &str = "assets";
pub const ISSUANCES_CF: &str = "issuances";
pub const DESTRUCTIONS_CF: &str = "destructions";
pub const BURNS_CF: &str = "burns";
pub const DIVIDENDS_CF: &str = "dividends";
pub const ESCROWS_CF: &str = "escrows";
pub const META_CF: &str = "meta";

pub const COLUMN_FAMILIES: [&str; 10] = [
    BALANCES_CF,
    DEBITS_CF,
    CREDITS_CF,
    ASSETS_CF,
    ISSUANCES_CF,
    DESTRUCTIONS_CF,
    BURNS_CF,
    DIVIDENDS_CF,
    ESCROWS_CF,
    META_CF,
];

const ASSET_NAME_PREFIX: u8 = b'n';
const ASSET_ID_PREFIX: u8 = b'i';
const LAST_BLOCK_KEY: &[u8] = b"last_block";

/// `asset ‖ address`, so that balances of one asset are contiguous
fn balance_key(address: &str, asset: AssetId) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + address.len());
    key.extend_from_slice(&asset.to_be_bytes());
    key.extend_from_slice(address.as_bytes());
    key
}

fn asset_name_key(name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + name.len());
    key.push(ASSET_NAME_PREFIX);
    key.extend_from_slice(name.as_bytes());
    key
}

fn asset_id_key(id: AssetId) -> [u8; 9] {
    let mut key = [ASSET_ID_PREFIX; 9];
    key[1..].copy_from_slice(&id.to_be_bytes());
    key
}

fn decode_balance_key(key: &[u8]) -> Result<(AssetId, String), LedgerBackendErr> {
    if key.len() < 8 {
        return Err(LedgerBackendErr::CorruptData);
    }

    let (asset, address) = key.split_at(8);
    let mut buf = [0; 8];
    buf.copy_from_slice(asset);
    let address =
        String::from_utf8(address.to_vec()).map_err(|_| LedgerBackendErr::CorruptData)?;
    Ok((AssetId::from_be_bytes(buf), address))
}

/// `RocksDB` backed ledger. Append-only tables are keyed by a big-endian
/// sequence number so iteration yields insertion order.
#[derive(Clone)]
pub struct DiskBackend {
    db: Arc<DB>,
}

impl DiskBackend {
    pub fn new(db: Arc<DB>) -> Self {
        Self { db }
    }

    fn cf(&self, name: &'static str) -> Result<Arc<BoundColumnFamily<'_>>, LedgerBackendErr> {
        self.db
            .cf_handle(name)
            .ok_or(LedgerBackendErr::Error("missing column family"))
    }

    fn scan<T: Decode>(&self, cf: &'static str) -> Result<Vec<T>, LedgerBackendErr> {
        let handle = self.cf(cf)?;
        self.db
            .iterator_cf(&handle, IteratorMode::Start)
            .map(|item| -> Result<T, LedgerBackendErr> {
                let (_, v) = item?;
                Ok(crate::codec::decode(&v)?)
            })
            .collect()
    }

    fn scan_at<T: Decode>(
        &self,
        snapshot: &Snapshot<'_>,
        cf: &'static str,
    ) -> Result<Vec<T>, LedgerBackendErr> {
        let handle = self.cf(cf)?;
        snapshot
            .iterator_cf(&handle, IteratorMode::Start)
            .map(|item| -> Result<T, LedgerBackendErr> {
                let (_, v) = item?;
                Ok(crate::codec::decode(&v)?)
            })
            .collect()
    }

    fn next_seq(&self, cf: &'static str) -> Result<u64, LedgerBackendErr> {
        let handle = self.cf(cf)?;
        let last = self.db.iterator_cf(&handle, IteratorMode::End).next();

        match last {
            None => Ok(0),
            Some(item) => {
                let (k, _) = item?;
                let bytes: [u8; 8] = k
                    .as_ref()
                    .try_into()
                    .map_err(|_| LedgerBackendErr::CorruptData)?;
                Ok(u64::from_be_bytes(bytes) + 1)
            }
        }
    }

    fn append<T: Encode>(
        &self,
        txn: &Transaction<'_, DB>,
        cf: &'static str,
        rows: &[T],
    ) -> Result<(), LedgerBackendErr> {
        if rows.is_empty() {
            return Ok(());
        }

        let handle = self.cf(cf)?;
        let mut seq = self.next_seq(cf)?;

        for row in rows {
            txn.put_cf(&handle, seq.to_be_bytes(), crate::codec::encode_to_vec(row)?)?;
            seq += 1;
        }

        Ok(())
    }

    fn balances_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Balance>, LedgerBackendErr> {
        let handle = self.cf(BALANCES_CF)?;
        let mut out = vec![];

        let mode = IteratorMode::From(prefix, Direction::Forward);

        for item in self.db.iterator_cf(&handle, mode) {
            let (k, v) = item?;

            if !k.starts_with(prefix) {
                break;
            }

            let (asset, address) = decode_balance_key(&k)?;
            out.push(Balance {
                address,
                asset,
                quantity: crate::codec::decode(&v)?,
            });
        }

        Ok(out)
    }
}

impl LedgerBackend for DiskBackend {
    fn get_balance(
        &self,
        address: &str,
        asset: AssetId,
    ) -> Result<Option<u64>, LedgerBackendErr> {
        let handle = self.cf(BALANCES_CF)?;
        match self.db.get_cf(&handle, balance_key(address, asset))? {
            Some(bytes) => Ok(Some(crate::codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn balances_of_asset(&self, asset: AssetId) -> Result<Vec<Balance>, LedgerBackendErr> {
        self.balances_with_prefix(&asset.to_be_bytes())
    }

    fn balances_of_address(&self, address: &str) -> Result<Vec<Balance>, LedgerBackendErr> {
        Ok(self
            .all_balances()?
            .into_iter()
            .filter(|b| b.address == address)
            .collect())
    }

    fn all_balances(&self) -> Result<Vec<Balance>, LedgerBackendErr> {
        self.balances_with_prefix(&[])
    }

    fn asset_by_name(&self, name: &str) -> Result<Option<AssetRow>, LedgerBackendErr> {
        let handle = self.cf(ASSETS_CF)?;
        match self.db.get_cf(&handle, asset_name_key(name))? {
            Some(bytes) => {
                let id: AssetId = crate::codec::decode(&bytes)?;
                // The id row is written in the same transaction as the name row
                let row = self.asset_by_id(id)?.ok_or(LedgerBackendErr::CorruptData)?;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    fn asset_by_id(&self, id: AssetId) -> Result<Option<AssetRow>, LedgerBackendErr> {
        let handle = self.cf(ASSETS_CF)?;
        match self.db.get_cf(&handle, asset_id_key(id))? {
            Some(bytes) => Ok(Some(crate::codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn issuances(&self) -> Result<Vec<Issuance>, LedgerBackendErr> {
        self.scan(ISSUANCES_CF)
    }

    fn destructions(&self) -> Result<Vec<Destruction>, LedgerBackendErr> {
        self.scan(DESTRUCTIONS_CF)
    }

    fn burns(&self) -> Result<Vec<Burn>, LedgerBackendErr> {
        self.scan(BURNS_CF)
    }

    fn dividends(&self) -> Result<Vec<Dividend>, LedgerBackendErr> {
        self.scan(DIVIDENDS_CF)
    }

    fn debits(&self) -> Result<Vec<DebitRecord>, LedgerBackendErr> {
        self.scan(DEBITS_CF)
    }

    fn credits(&self) -> Result<Vec<CreditRecord>, LedgerBackendErr> {
        self.scan(CREDITS_CF)
    }

    fn escrow(&self, key: &EscrowKey) -> Result<Option<Escrow>, LedgerBackendErr> {
        let handle = self.cf(ESCROWS_CF)?;
        match self.db.get_cf(&handle, crate::codec::encode_to_vec(key)?)? {
            Some(bytes) => Ok(Some(crate::codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn escrows(&self) -> Result<Vec<Escrow>, LedgerBackendErr> {
        let mut escrows: Vec<Escrow> = self.scan(ESCROWS_CF)?;
        escrows.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(escrows)
    }

    fn last_block(&self) -> Result<Option<u32>, LedgerBackendErr> {
        let handle = self.cf(META_CF)?;
        match self.db.get_cf(&handle, LAST_BLOCK_KEY)? {
            Some(bytes) => Ok(Some(crate::codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerBackendErr> {
        let snapshot = self.db.snapshot();

        let meta_cf = self.cf(META_CF)?;
        let last_block = match snapshot.get_cf(&meta_cf, LAST_BLOCK_KEY)? {
            Some(bytes) => Some(crate::codec::decode(&bytes)?),
            None => None,
        };

        let balances_cf = self.cf(BALANCES_CF)?;
        let mut balances = vec![];
        for item in snapshot.iterator_cf(&balances_cf, IteratorMode::Start) {
            let (k, v) = item?;
            let (asset, address) = decode_balance_key(&k)?;
            balances.push(Balance {
                address,
                asset,
                quantity: crate::codec::decode(&v)?,
            });
        }

        let mut escrows: Vec<Escrow> = self.scan_at(&snapshot, ESCROWS_CF)?;
        escrows.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(LedgerSnapshot {
            last_block,
            balances,
            escrows,
            issuances: self.scan_at(&snapshot, ISSUANCES_CF)?,
            destructions: self.scan_at(&snapshot, DESTRUCTIONS_CF)?,
            burns: self.scan_at(&snapshot, BURNS_CF)?,
            dividends: self.scan_at(&snapshot, DIVIDENDS_CF)?,
        })
    }

    fn commit(&self, batch: LedgerBatch) -> Result<(), LedgerBackendErr> {
        let txn = self.db.transaction();

        let balances_cf = self.cf(BALANCES_CF)?;
        for ((address, asset), quantity) in &batch.balances {
            txn.put_cf(
                &balances_cf,
                balance_key(address, *asset),
                crate::codec::encode_to_vec(quantity)?,
            )?;
        }

        let assets_cf = self.cf(ASSETS_CF)?;
        for row in &batch.assets {
            txn.put_cf(
                &assets_cf,
                asset_name_key(&row.asset_name),
                crate::codec::encode_to_vec(&row.asset_id)?,
            )?;
            txn.put_cf(
                &assets_cf,
                asset_id_key(row.asset_id),
                crate::codec::encode_to_vec(row)?,
            )?;
        }

        let escrows_cf = self.cf(ESCROWS_CF)?;
        for (key, escrow) in &batch.escrows {
            let key = crate::codec::encode_to_vec(key)?;
            match escrow {
                Some(escrow) => {
                    txn.put_cf(&escrows_cf, key, crate::codec::encode_to_vec(escrow)?)?;
                }
                None => {
                    txn.delete_cf(&escrows_cf, key)?;
                }
            }
        }

        self.append(&txn, DEBITS_CF, &batch.debits)?;
        self.append(&txn, CREDITS_CF, &batch.credits)?;
        self.append(&txn, ISSUANCES_CF, &batch.issuances)?;
        self.append(&txn, DESTRUCTIONS_CF, &batch.destructions)?;
        self.append(&txn, BURNS_CF, &batch.burns)?;
        self.append(&txn, DIVIDENDS_CF, &batch.dividends)?;

        let meta_cf = self.cf(META_CF)?;
        txn.put_cf(
            &meta_cf,
            LAST_BLOCK_KEY,
            crate::codec::encode_to_vec(&batch.block_index)?,
        )?;

        txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::backend::open_rocksdb;
    use crate::primitives::{Action, EscrowKind, RecordStatus};
    use rand::Rng;

    fn backend() -> DiskBackend {
        let mut path = std::env::temp_dir();
        path.push(hex::encode(rand::thread_rng().gen::<[u8; 32]>()));
        path.push("Tokenlayer");
        DiskBackend::new(open_rocksdb(path).unwrap())
    }

    fn burn(source: &str, earned: u64) -> Burn {
        Burn {
            tx_index: 0,
            tx_hash: hex::encode(rand::thread_rng().gen::<[u8; 32]>()),
            block_index: 1,
            source: source.to_owned(),
            burned: earned / 1000,
            earned,
            status: RecordStatus::Valid,
        }
    }

    #[test]
    fn it_round_trips_balances() {
        let backend = backend();
        let mut batch = LedgerBatch::new(7);
        batch.balances.insert(("alice".to_owned(), 1), 50);
        batch.balances.insert(("bob".to_owned(), 1), 0);
        batch.balances.insert(("alice".to_owned(), 17_577), 9);
        backend.commit(batch).unwrap();

        assert_eq!(backend.get_balance("alice", 1).unwrap(), Some(50));
        assert_eq!(backend.get_balance("bob", 1).unwrap(), Some(0));
        assert_eq!(backend.get_balance("bob", 17_577).unwrap(), None);
        assert_eq!(backend.balances_of_asset(1).unwrap().len(), 2);
        assert_eq!(backend.balances_of_asset(17_577).unwrap().len(), 1);
        assert_eq!(backend.balances_of_address("alice").unwrap().len(), 2);
        assert_eq!(backend.last_block().unwrap(), Some(7));
    }

    #[test]
    fn it_appends_records_in_order() {
        let backend = backend();
        for i in 1..=3u64 {
            let mut batch = LedgerBatch::new(i as u32);
            batch.burns.push(burn("alice", i * 1000));
            batch.debits.push(DebitRecord {
                block_index: i as u32,
                address: "alice".to_owned(),
                asset: 1,
                quantity: i,
                action: Action::Send,
                event: "tx".to_owned(),
            });
            backend.commit(batch).unwrap();
        }

        let earned: Vec<_> = backend.burns().unwrap().iter().map(|b| b.earned).collect();
        assert_eq!(earned, vec![1000, 2000, 3000]);
        assert_eq!(backend.debits().unwrap().len(), 3);
        assert!(backend.credits().unwrap().is_empty());
    }

    #[test]
    fn it_looks_up_assets_both_ways() {
        let backend = backend();
        let mut batch = LedgerBatch::new(1);
        batch.assets.push(AssetRow {
            asset_id: 95_428_956_661_682_177,
            asset_name: "A95428956661682177".to_owned(),
            block_index: 1,
        });
        backend.commit(batch).unwrap();

        let row = backend.asset_by_name("A95428956661682177").unwrap().unwrap();
        assert_eq!(row.asset_id, 95_428_956_661_682_177);
        assert_eq!(
            backend
                .asset_by_id(95_428_956_661_682_177)
                .unwrap()
                .unwrap()
                .asset_name,
            "A95428956661682177"
        );
        assert!(backend.asset_by_name("BAAA").unwrap().is_none());
    }

    #[test]
    fn it_stores_and_removes_escrows() {
        let backend = backend();
        let key = EscrowKey {
            escrow_id: "match".to_owned(),
            address: "bob".to_owned(),
            asset: 1,
        };
        let mut batch = LedgerBatch::new(1);
        batch.escrows.insert(
            key.clone(),
            Some(Escrow {
                key: key.clone(),
                kind: EscrowKind::BetMatch,
                quantity: 10,
            }),
        );
        backend.commit(batch).unwrap();
        assert_eq!(backend.escrow(&key).unwrap().unwrap().quantity, 10);

        let mut batch = LedgerBatch::new(2);
        batch.escrows.insert(key.clone(), None);
        backend.commit(batch).unwrap();
        assert!(backend.escrows().unwrap().is_empty());
    }

    #[test]
    fn it_reads_snapshots_from_one_commit() {
        let backend = backend();
        let mut batch = LedgerBatch::new(1);
        batch.burns.push(burn("alice", 1000));
        batch.balances.insert(("alice".to_owned(), 1), 1000);
        backend.commit(batch).unwrap();

        let before = backend.snapshot().unwrap();

        let mut batch = LedgerBatch::new(2);
        batch.burns.push(burn("bob", 500));
        batch.balances.insert(("bob".to_owned(), 1), 500);
        backend.commit(batch).unwrap();

        let after = backend.snapshot().unwrap();
        assert_eq!(before.last_block, Some(1));
        assert_eq!(before.burns.len(), 1);
        assert_eq!(before.balances.len(), 1);
        assert_eq!(after.last_block, Some(2));
        assert_eq!(after.burns.len(), 2);
        assert_eq!(after.balances.len(), 2);
    }
}
