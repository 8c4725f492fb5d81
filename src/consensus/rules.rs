// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use static_assertions::*;

/// Money type used for supply aggregates, wide enough to never overflow
/// when summing `u64` quantities and to express a negative supply.
pub type Money = i128;

/// Satoshis per unit of a divisible asset.
pub const UNIT: u64 = 100_000_000;

/// Number of decimal places of a divisible asset.
pub const UNIT_DECIMALS: u32 = 8;

/// Balance ceiling. Every node must use the same value, balances saturate here.
pub const MAX_INT: u64 = (1 << 63) - 1;

/// Name of the base chain currency. Never tracked by the ledger.
pub const BTC: &str = "BTC";

/// Name of the protocol currency.
pub const XCP: &str = "XCP";

/// Asset id of the base chain currency
pub const BTC_ID: u64 = 0;

/// Asset id of the protocol currency
pub const XCP_ID: u64 = 1;

/// Alphabet of Base-26 asset names, most significant digit first.
pub const B26_DIGITS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Bitcoin Base58 alphabet
pub const B58_DIGITS: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Names shorter than this are never valid.
pub const MIN_ASSET_NAME_LEN: usize = 4;

/// Non-numeric names of this length or longer are rejected once numeric names are active.
pub const MAX_ALPHABETIC_ASSET_NAME_LEN: usize = 12;

/// Smallest id an alphabetic name can produce: `BAAA`.
pub const MIN_ALPHABETIC_ASSET_ID: u64 = 26u64.pow(3);

/// Smallest numeric asset id, `26^12 + 1`.
pub const MIN_NUMERIC_ASSET_ID: u64 = 26u64.pow(12) + 1;

/// Largest numeric asset id, `2^64 - 1`.
pub const MAX_NUMERIC_ASSET_ID: u64 = u64::MAX;

/// Leading character of numeric asset names
pub const NUMERIC_ASSET_PREFIX: char = 'A';

/// Multisig address field separator
pub const MULTISIG_SEPARATOR: char = '_';

/// Bounds of the required signatures count of a multisig address
pub const MULTISIG_MIN_REQUIRED: u8 = 1;
pub const MULTISIG_MAX_REQUIRED: u8 = 3;

/// Bounds of the possible signatures count of a multisig address
pub const MULTISIG_MIN_POSSIBLE: u8 = 2;
pub const MULTISIG_MAX_POSSIBLE: u8 = 3;

/// Length of the Base58Check checksum in bytes
pub const CHECKSUM_LEN: usize = 4;

/// Contract addresses are 40 character hex ids.
pub const CONTRACT_ADDRESS_LEN: usize = 40;

/// Address version byte on mainnet
pub const ADDRESS_VERSION_MAINNET: u8 = 0x00;

/// Address version byte on testnet
pub const ADDRESS_VERSION_TESTNET: u8 = 0x6f;

/// Returns true if the quantity can be applied to a balance.
pub fn quantity_check(quantity: u64) -> bool {
    quantity <= MAX_INT
}

/// Returns true if the address is a contract id rather than a base chain address.
pub fn is_contract_address(address: &str) -> bool {
    address.len() == CONTRACT_ADDRESS_LEN
}

const_assert!(MAX_INT == i64::MAX as u64);
const_assert!(MIN_NUMERIC_ASSET_ID > MIN_ALPHABETIC_ASSET_ID);
const_assert!(MULTISIG_MIN_REQUIRED >= 1);
const_assert!(MULTISIG_MAX_POSSIBLE <= MULTISIG_MAX_REQUIRED);
const_assert_eq!(UNIT, 10u64.pow(UNIT_DECIMALS));
const_assert_eq!(BTC_ID + 1, XCP_ID);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_quantity_checks() {
        assert!(quantity_check(0));
        assert!(quantity_check(MAX_INT));
        assert!(!quantity_check(MAX_INT + 1));
        assert!(!quantity_check(u64::MAX));
    }

    #[test]
    fn it_detects_contract_addresses() {
        assert!(is_contract_address(&"a".repeat(40)));
        assert!(!is_contract_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2"));
    }

    #[test]
    fn it_has_disjoint_alphabets() {
        assert_eq!(B58_DIGITS.len(), 58);
        for c in [b'0', b'O', b'I', b'l'] {
            assert!(!B58_DIGITS.contains(&c));
        }
        assert_eq!(B26_DIGITS[0], b'A');
        assert_eq!(B26_DIGITS[25], b'Z');
    }
}
