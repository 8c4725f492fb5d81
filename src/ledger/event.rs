// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{Action, AssetId, EscrowKey, EscrowKind, RecordStatus};
use log::*;
use std::fmt;

/// Something that happened to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent<'a> {
    Debit {
        block_index: u32,
        address: &'a str,
        asset: AssetId,
        quantity: u64,
        action: &'a Action,
        event: &'a str,
    },
    Credit {
        block_index: u32,
        address: &'a str,
        asset: AssetId,
        quantity: u64,
        action: &'a Action,
        event: &'a str,
    },
    AssetRegistered {
        block_index: u32,
        asset: AssetId,
        name: &'a str,
    },
    EscrowLocked {
        key: &'a EscrowKey,
        kind: EscrowKind,
        quantity: u64,
    },
    EscrowReleased {
        key: &'a EscrowKey,
        destination: &'a str,
        quantity: u64,
    },
    Recorded {
        table: &'static str,
        tx_hash: &'a str,
        status: &'a RecordStatus,
    },
    Committed {
        block_index: u32,
        mutations: usize,
    },
    RolledBack {
        block_index: u32,
        mutations: usize,
    },
}

impl LedgerEvent<'_> {
    pub fn log(&self) {
        match self {
            Self::Committed { .. } => info!("{self}"),
            Self::RolledBack { .. } => warn!("{self}"),
            _ => debug!("{self}"),
        }
    }
}

impl fmt::Display for LedgerEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debit {
                block_index,
                address,
                asset,
                quantity,
                action,
                event,
            } => write!(
                f,
                "Debit {quantity} of asset {asset} from {address} at block {block_index} ({action}, {event})"
            ),
            Self::Credit {
                block_index,
                address,
                asset,
                quantity,
                action,
                event,
            } => write!(
                f,
                "Credit {quantity} of asset {asset} to {address} at block {block_index} ({action}, {event})"
            ),
            Self::AssetRegistered {
                block_index,
                asset,
                name,
            } => write!(f, "Registered asset {name} as {asset} at block {block_index}"),
            Self::EscrowLocked {
                key,
                kind,
                quantity,
            } => write!(f, "Escrowed {quantity} in {kind} {key}"),
            Self::EscrowReleased {
                key,
                destination,
                quantity,
            } => write!(f, "Released {quantity} from escrow {key} to {destination}"),
            Self::Recorded {
                table,
                tx_hash,
                status,
            } => write!(f, "Recorded {table} {tx_hash} ({status})"),
            Self::Committed {
                block_index,
                mutations,
            } => write!(
                f,
                "Committed block {block_index} with {mutations} balance mutations"
            ),
            Self::RolledBack {
                block_index,
                mutations,
            } => write!(
                f,
                "Rolled back block {block_index}, discarded {mutations} balance mutations"
            ),
        }
    }
}
