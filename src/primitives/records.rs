// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Rows persisted by the ledger. All of them are append-only except balances
//! and escrows.

use crate::primitives::AssetId;
use bincode::{Decode, Encode};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Balance {
    pub address: String,
    pub asset: AssetId,
    pub quantity: u64,
}

/// Reason a balance changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Encode, Decode)]
pub enum Action {
    Send,
    Issuance,
    IssuanceFee,
    Destroy,
    Burn,
    Dividend,
    DividendFee,
    Escrow,
    EscrowRelease,

    /// Actions of message types handled outside of the core
    Other(String),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => f.write_str("send"),
            Self::Issuance => f.write_str("issuance"),
            Self::IssuanceFee => f.write_str("issuance fee"),
            Self::Destroy => f.write_str("destroy"),
            Self::Burn => f.write_str("burn"),
            Self::Dividend => f.write_str("dividend"),
            Self::DividendFee => f.write_str("dividend fee"),
            Self::Escrow => f.write_str("escrow"),
            Self::EscrowRelease => f.write_str("escrow release"),
            Self::Other(action) => f.write_str(action),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DebitRecord {
    pub block_index: u32,
    pub address: String,
    pub asset: AssetId,
    pub quantity: u64,
    pub action: Action,

    /// Hash of the transaction or id of the match causing the debit
    pub event: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct CreditRecord {
    pub block_index: u32,
    pub address: String,
    pub asset: AssetId,
    pub quantity: u64,
    pub action: Action,
    pub event: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Encode, Decode)]
pub enum RecordStatus {
    Valid,
    Invalid(String),
}

impl RecordStatus {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("valid"),
            Self::Invalid(reason) => write!(f, "invalid: {reason}"),
        }
    }
}

/// Row of the persisted `name <-> id` lookup table
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AssetRow {
    pub asset_id: AssetId,
    pub asset_name: String,
    pub block_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Issuance {
    pub tx_index: u64,
    pub tx_hash: String,
    pub block_index: u32,
    pub asset: AssetId,
    pub quantity: u64,
    pub divisible: bool,
    pub source: String,
    pub issuer: String,
    pub transfer: bool,
    pub locked: bool,
    pub description: String,

    /// Paid in XCP
    pub fee_paid: u64,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Destruction {
    pub tx_index: u64,
    pub tx_hash: String,
    pub block_index: u32,
    pub source: String,
    pub asset: AssetId,
    pub quantity: u64,
    pub tag: String,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Burn {
    pub tx_index: u64,
    pub tx_hash: String,
    pub block_index: u32,
    pub source: String,

    /// Base chain currency sent to the burn address
    pub burned: u64,

    /// XCP created
    pub earned: u64,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Dividend {
    pub tx_index: u64,
    pub tx_hash: String,
    pub block_index: u32,
    pub source: String,
    pub asset: AssetId,
    pub dividend_asset: AssetId,
    pub quantity_per_unit: u64,

    /// Paid in XCP
    pub fee_paid: u64,
    pub status: RecordStatus,
}

/// What holds escrowed funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub enum EscrowKind {
    Order,
    OrderMatch,
    Bet,
    BetMatch,
    Rps,
    RpsMatch,

    /// Gas held by a contract execution
    Execution,
}

impl fmt::Display for EscrowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Order => "order",
            Self::OrderMatch => "order match",
            Self::Bet => "bet",
            Self::BetMatch => "bet match",
            Self::Rps => "rps",
            Self::RpsMatch => "rps match",
            Self::Execution => "execution",
        };
        f.write_str(s)
    }
}

/// Escrows are unique per `(escrow_id, address, asset)`. Both sides of a
/// match share the escrow id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct EscrowKey {
    pub escrow_id: String,
    pub address: String,
    pub asset: AssetId,
}

impl fmt::Display for EscrowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.escrow_id, self.address, self.asset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Escrow {
    pub key: EscrowKey,
    pub kind: EscrowKind,
    pub quantity: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_displays_status() {
        assert_eq!(RecordStatus::Valid.to_string(), "valid");
        assert_eq!(
            RecordStatus::Invalid("insufficient funds".to_owned()).to_string(),
            "invalid: insufficient funds"
        );
        assert!(!RecordStatus::Invalid(String::new()).is_valid());
    }

    #[test]
    fn it_displays_actions() {
        assert_eq!(Action::IssuanceFee.to_string(), "issuance fee");
        assert_eq!(Action::Other("bet settled".to_owned()).to_string(), "bet settled");
    }

    #[test]
    fn it_orders_escrow_keys_by_id_first() {
        let a = EscrowKey {
            escrow_id: "aa".to_owned(),
            address: "z".to_owned(),
            asset: 9,
        };
        let b = EscrowKey {
            escrow_id: "ab".to_owned(),
            address: "a".to_owned(),
            asset: 1,
        };
        assert!(a < b);
    }
}
