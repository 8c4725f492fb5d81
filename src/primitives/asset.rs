// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Asset name to id mapping.
//!
//! Before `hotfix_numeric_assets` ids are derived from names algorithmically:
//! alphabetic names are Base-26 numbers over `A..Z` and, once
//! `numeric_asset_names` is active, names of the form `A{decimal}` map to
//! the decimal itself. After the hotfix every lookup goes through the
//! persisted asset table.

use crate::chain::{LedgerBackend, LedgerBackendErr};
use crate::consensus::*;
use std::fmt;

/// 64 bit asset identifier
pub type AssetId = u64;

/// Returned by an id to name lookup missing from the asset table.
pub const UNKNOWN_ASSET_NAME: &str = "0";

#[derive(Debug)]
pub enum AssetErr {
    /// Name has fewer than four characters or encodes an id below `26^3`
    TooShort,

    /// Non-numeric name too long for the active rules
    TooLong,

    /// `A` prefixed name with a non-decimal remainder
    NotNumeric,

    /// Numeric name outside of `[26^12 + 1, 2^64 - 1]`
    OutOfRange,

    /// Alphabetic names cannot start with `A`
    InvalidPrefix,

    /// Character outside of `A..Z`
    InvalidCharacter(char),

    /// Id below `26^3` that is not reserved
    TooLow,

    /// Id wider than 64 bits
    TooHigh,

    /// Asset is not in the asset table
    NoSuchAsset(String),

    /// Backend error
    Backend(LedgerBackendErr),
}

impl fmt::Display for AssetErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "asset name too short"),
            Self::TooLong => write!(f, "long asset names must be numeric"),
            Self::NotNumeric => write!(f, "non-numeric asset name starts with 'A'"),
            Self::OutOfRange => write!(f, "numeric asset name not in range"),
            Self::InvalidPrefix => write!(f, "non-numeric asset name starts with 'A'"),
            Self::InvalidCharacter(c) => write!(f, "invalid character: {c}"),
            Self::TooLow => write!(f, "asset id too low"),
            Self::TooHigh => write!(f, "asset id too high"),
            Self::NoSuchAsset(asset) => write!(f, "no such asset: {asset}"),
            Self::Backend(err) => write!(f, "backend error: {err}"),
        }
    }
}

impl std::error::Error for AssetErr {}

impl From<LedgerBackendErr> for AssetErr {
    fn from(other: LedgerBackendErr) -> Self {
        Self::Backend(other)
    }
}

/// Persisted asset table as seen by the codec. Implemented by every
/// [`LedgerBackend`] and by open block transactions, which also see the
/// assets registered in the block.
pub trait AssetLookup {
    fn asset_id_by_name(&self, name: &str) -> Result<Option<AssetId>, LedgerBackendErr>;

    fn asset_name_by_id(&self, id: AssetId) -> Result<Option<String>, LedgerBackendErr>;

    /// Divisibility of the first valid issuance of the asset
    fn asset_divisibility(&self, id: AssetId) -> Result<Option<bool>, LedgerBackendErr>;
}

impl<B: LedgerBackend> AssetLookup for B {
    fn asset_id_by_name(&self, name: &str) -> Result<Option<AssetId>, LedgerBackendErr> {
        Ok(self.asset_by_name(name)?.map(|row| row.asset_id))
    }

    fn asset_name_by_id(&self, id: AssetId) -> Result<Option<String>, LedgerBackendErr> {
        Ok(self.asset_by_id(id)?.map(|row| row.asset_name))
    }

    fn asset_divisibility(&self, id: AssetId) -> Result<Option<bool>, LedgerBackendErr> {
        Ok(self.first_valid_issuance(id)?.map(|i| i.divisible))
    }
}

fn reserved_id(name: &str) -> Option<AssetId> {
    match name {
        BTC => Some(BTC_ID),
        XCP => Some(XCP_ID),
        _ => None,
    }
}

fn reserved_name(id: AssetId) -> Option<&'static str> {
    match id {
        BTC_ID => Some(BTC),
        XCP_ID => Some(XCP),
        _ => None,
    }
}

/// Narrows an id parsed from a wider source.
pub fn asset_id_from_wide(id: u128) -> Result<AssetId, AssetErr> {
    AssetId::try_from(id).map_err(|_| AssetErr::TooHigh)
}

/// Derives the id of an asset name under the rules active at `height`.
pub fn generate_asset_id(
    name: &str,
    height: u32,
    gate: &ProtocolGate,
) -> Result<AssetId, AssetErr> {
    if let Some(id) = reserved_id(name) {
        return Ok(id);
    }

    let len = name.chars().count();

    if len < MIN_ASSET_NAME_LEN {
        return Err(AssetErr::TooShort);
    }

    if gate.enabled(ProtocolChange::NumericAssetNames, height) {
        if let Some(digits) = name.strip_prefix(NUMERIC_ASSET_PREFIX) {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AssetErr::NotNumeric);
            }

            let id: AssetId = digits.parse().map_err(|_| AssetErr::OutOfRange)?;

            if !(MIN_NUMERIC_ASSET_ID..=MAX_NUMERIC_ASSET_ID).contains(&id) {
                return Err(AssetErr::OutOfRange);
            }

            return Ok(id);
        } else if len > MAX_ALPHABETIC_ASSET_NAME_LEN {
            return Err(AssetErr::TooLong);
        }
    }

    if name.starts_with(NUMERIC_ASSET_PREFIX) {
        return Err(AssetErr::InvalidPrefix);
    }

    let mut id: AssetId = 0;

    for c in name.chars() {
        let digit = B26_DIGITS
            .iter()
            .position(|d| *d as char == c)
            .ok_or(AssetErr::InvalidCharacter(c))?;

        id = id
            .checked_mul(26)
            .and_then(|id| id.checked_add(digit as AssetId))
            .ok_or(AssetErr::TooLong)?;
    }

    if id < MIN_ALPHABETIC_ASSET_ID {
        return Err(AssetErr::TooShort);
    }

    Ok(id)
}

/// Derives the name of an asset id under the rules active at `height`.
pub fn generate_asset_name(
    id: AssetId,
    height: u32,
    gate: &ProtocolGate,
) -> Result<String, AssetErr> {
    if let Some(name) = reserved_name(id) {
        return Ok(name.to_owned());
    }

    if id < MIN_ALPHABETIC_ASSET_ID {
        return Err(AssetErr::TooLow);
    }

    if gate.enabled(ProtocolChange::NumericAssetNames, height) && id >= MIN_NUMERIC_ASSET_ID {
        return Ok(format!("{NUMERIC_ASSET_PREFIX}{id}"));
    }

    let mut digits = vec![];
    let mut n = id;

    while n > 0 {
        digits.push(B26_DIGITS[(n % 26) as usize]);
        n /= 26;
    }

    digits.reverse();
    String::from_utf8(digits).map_err(|_| AssetErr::InvalidCharacter('?'))
}

/// Resolves an asset name to its id at `height`, consulting the asset
/// table once the hotfix is active.
pub fn get_asset_id<L: AssetLookup + ?Sized>(
    lookup: &L,
    name: &str,
    height: u32,
    gate: &ProtocolGate,
) -> Result<AssetId, AssetErr> {
    if !gate.enabled(ProtocolChange::HotfixNumericAssets, height) {
        return generate_asset_id(name, height, gate);
    }

    if let Some(id) = reserved_id(name) {
        return Ok(id);
    }

    lookup
        .asset_id_by_name(name)?
        .ok_or_else(|| AssetErr::NoSuchAsset(name.to_owned()))
}

/// Resolves an asset id to its name at `height`. After the hotfix an id
/// missing from the asset table resolves to [`UNKNOWN_ASSET_NAME`].
pub fn get_asset_name<L: AssetLookup + ?Sized>(
    lookup: &L,
    id: AssetId,
    height: u32,
    gate: &ProtocolGate,
) -> Result<String, AssetErr> {
    if !gate.enabled(ProtocolChange::HotfixNumericAssets, height) {
        return generate_asset_name(id, height, gate);
    }

    if let Some(name) = reserved_name(id) {
        return Ok(name.to_owned());
    }

    Ok(lookup
        .asset_name_by_id(id)?
        .unwrap_or_else(|| UNKNOWN_ASSET_NAME.to_owned()))
}

pub fn is_divisible<L: AssetLookup + ?Sized>(lookup: &L, id: AssetId) -> Result<bool, AssetErr> {
    if reserved_name(id).is_some() {
        return Ok(true);
    }

    lookup
        .asset_divisibility(id)?
        .ok_or_else(|| AssetErr::NoSuchAsset(id.to_string()))
}
