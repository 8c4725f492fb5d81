// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Base58Check encoding of versioned payloads.

use crate::consensus::CHECKSUM_LEN;
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base58Err {
    /// Character outside of the Base58 alphabet
    InvalidCharacter(char),

    /// Payload is not valid hex
    InvalidHex,

    /// Decoded bytes cannot hold a version byte and a checksum
    InvalidLength,

    /// Version byte does not match the expected network
    VersionMismatch { expected: u8, found: u8 },

    /// Checksum does not match the payload
    ChecksumMismatch,
}

impl fmt::Display for Base58Err {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCharacter(c) => write!(f, "not a valid base58 character: {c}"),
            Self::InvalidHex => write!(f, "payload is not valid hex"),
            Self::InvalidLength => write!(f, "decoded data is too short"),
            Self::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "incorrect version byte: expected {expected:#04x}, found {found:#04x}"
                )
            }
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
        }
    }
}

impl std::error::Error for Base58Err {}

impl From<bs58::decode::Error> for Base58Err {
    fn from(other: bs58::decode::Error) -> Self {
        match other {
            bs58::decode::Error::InvalidCharacter { character, .. } => {
                Self::InvalidCharacter(character)
            }
            bs58::decode::Error::NonAsciiCharacter { .. } => Self::InvalidCharacter('?'),
            _ => Self::InvalidLength,
        }
    }
}

impl From<hex::FromHexError> for Base58Err {
    fn from(_: hex::FromHexError) -> Self {
        Self::InvalidHex
    }
}

/// Double SHA-256
#[must_use]
pub fn dhash(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Encodes bytes as a big-endian Base58 number. Every leading zero byte
/// becomes a leading `1`.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    bs58::encode(bytes)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_string()
}

pub fn decode(s: &str) -> Result<Vec<u8>, Base58Err> {
    let bytes = bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()?;
    Ok(bytes)
}

/// Encodes `version ‖ payload ‖ checksum`.
///
/// # Panics
///
/// Panics if the encoded address does not decode back to the payload. This
/// can only happen through a defect in the codec itself.
#[must_use]
pub fn check_encode(payload: &[u8], version: u8) -> String {
    let mut bytes = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    bytes.push(version);
    bytes.extend_from_slice(payload);
    let checksum = dhash(&bytes);
    bytes.extend_from_slice(&checksum[..CHECKSUM_LEN]);

    let address = encode(&bytes);

    match check_decode(&address, version) {
        Ok(decoded) if decoded == payload => address,
        _ => panic!(
            "encoded address does not decode properly: {}",
            hex::encode(payload)
        ),
    }
}

/// Same as [`check_encode`] for a hex encoded payload
pub fn check_encode_hex(payload_hex: &str, version: u8) -> Result<String, Base58Err> {
    let payload = hex::decode(payload_hex)?;
    Ok(check_encode(&payload, version))
}

/// Decodes a Base58Check string and returns the payload without the version
/// byte and checksum.
pub fn check_decode(s: &str, version: u8) -> Result<Vec<u8>, Base58Err> {
    let bytes = decode(s)?;

    if bytes.len() < 1 + CHECKSUM_LEN {
        return Err(Base58Err::InvalidLength);
    }

    let (versioned, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);

    if versioned[0] != version {
        return Err(Base58Err::VersionMismatch {
            expected: version,
            found: versioned[0],
        });
    }

    if dhash(versioned)[..CHECKSUM_LEN] != *checksum {
        return Err(Base58Err::ChecksumMismatch);
    }

    Ok(versioned[1..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{ADDRESS_VERSION_MAINNET, ADDRESS_VERSION_TESTNET, B58_DIGITS};
    use quickcheck::*;

    const MAINNET_ADDR: &str = "1AGNa15ZQXAZUgFiqJ2i7Z2DPU2J6hW62i";
    const MAINNET_HASH: &str = "65a16059864a2fdbc7c99a4723a8395bc6f188eb";

    #[test]
    fn it_encodes_single_digits_with_alphabet() {
        for (i, digit) in B58_DIGITS.iter().enumerate() {
            let expected = (*digit as char).to_string();
            if i == 0 {
                // A lone zero byte is a leading zero
                assert_eq!(encode(&[0]), expected);
            } else {
                assert_eq!(encode(&[i as u8]), expected);
            }
        }
    }

    #[test]
    fn it_preserves_leading_zeros() {
        assert_eq!(encode(&[0, 0, 1]), "112");
        assert_eq!(decode("112").unwrap(), vec![0, 0, 1]);
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn it_encodes_known_address() {
        let addr = check_encode_hex(MAINNET_HASH, ADDRESS_VERSION_MAINNET).unwrap();
        assert_eq!(addr, MAINNET_ADDR);
        let payload = check_decode(MAINNET_ADDR, ADDRESS_VERSION_MAINNET).unwrap();
        assert_eq!(hex::encode(payload), MAINNET_HASH);
    }

    #[test]
    fn it_rejects_wrong_version() {
        assert_eq!(
            check_decode(MAINNET_ADDR, ADDRESS_VERSION_TESTNET),
            Err(Base58Err::VersionMismatch {
                expected: ADDRESS_VERSION_TESTNET,
                found: ADDRESS_VERSION_MAINNET
            })
        );
    }

    #[test]
    fn it_rejects_invalid_characters() {
        assert_eq!(
            check_decode("1AGNa15ZQXAZUgFiqJ2i7Z2DPU2J6hW60i", 0),
            Err(Base58Err::InvalidCharacter('0'))
        );
        assert_eq!(
            check_encode_hex("zz", ADDRESS_VERSION_MAINNET),
            Err(Base58Err::InvalidHex)
        );
    }

    #[test]
    fn it_rejects_short_input() {
        assert_eq!(check_decode("1111", 0), Err(Base58Err::InvalidLength));
        assert_eq!(check_decode("", 0), Err(Base58Err::InvalidLength));
    }

    #[test]
    fn it_detects_single_character_corruption() {
        for i in 1..MAINNET_ADDR.len() {
            let original = MAINNET_ADDR.as_bytes()[i];
            for digit in B58_DIGITS.iter().filter(|d| **d != original).take(8) {
                let mut corrupted = MAINNET_ADDR.as_bytes().to_vec();
                corrupted[i] = *digit;
                let corrupted = String::from_utf8(corrupted).unwrap();
                assert!(matches!(
                    check_decode(&corrupted, ADDRESS_VERSION_MAINNET),
                    Err(Base58Err::ChecksumMismatch | Base58Err::InvalidCharacter(_))
                ));
            }
        }
    }

    quickcheck! {
        fn prop_check_round_trip(payload: Vec<u8>, testnet: bool) -> bool {
            let version = if testnet { ADDRESS_VERSION_TESTNET } else { ADDRESS_VERSION_MAINNET };
            let addr = check_encode(&payload, version);
            check_decode(&addr, version).unwrap() == payload
        }

        fn prop_leading_zeros_become_ones(zeros: u8, tail: Vec<u8>) -> TestResult {
            if tail.first() == Some(&0) {
                return TestResult::discard();
            }
            let zeros = (zeros % 16) as usize;
            let mut bytes = vec![0; zeros];
            bytes.extend_from_slice(&tail);
            let encoded = encode(&bytes);
            let ones = encoded.chars().take_while(|c| *c == '1').count();
            TestResult::from_bool(ones == zeros && decode(&encoded).unwrap() == bytes)
        }
    }
}
