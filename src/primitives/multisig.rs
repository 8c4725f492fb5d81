// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Multi-signature address descriptors of the form
//! `{required}_{pub1}_..._{pubN}_{possible}` with the pubs sorted.

use crate::consensus::*;
use crate::primitives::base58::{self, Base58Err};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultisigErr {
    /// Signature counts out of bounds or not matching the number of pubs
    InvalidThreshold {
        required: u8,
        possible: u8,
        pubs: usize,
    },

    /// Signature count field is not an integer
    NotInteger(String),

    /// Address has no separator
    NotMultisig,

    /// Interior field is not a pubkeyhash address
    NotPubKeyHash(Base58Err),
}

impl fmt::Display for MultisigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidThreshold {
                required,
                possible,
                pubs,
            } => write!(
                f,
                "invalid multisig threshold: {required} of {possible} with {pubs} pubs"
            ),
            Self::NotInteger(field) => write!(f, "signature value not an integer: {field}"),
            Self::NotMultisig => write!(f, "not a multisig address"),
            Self::NotPubKeyHash(err) => write!(
                f,
                "multisig address must use pubkeyhashes, not public keys: {err}"
            ),
        }
    }
}

impl std::error::Error for MultisigErr {}

impl From<Base58Err> for MultisigErr {
    fn from(other: Base58Err) -> Self {
        Self::NotPubKeyHash(other)
    }
}

/// A parsed multisig descriptor. `pubs` are always sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MultisigAddress {
    required: u8,
    pubs: Vec<String>,
    possible: u8,
}

impl MultisigAddress {
    /// Builds a descriptor, sorting the pubs.
    pub fn new<S: AsRef<str>>(
        required: u8,
        pubs: &[S],
        possible: u8,
    ) -> Result<Self, MultisigErr> {
        validate(required, pubs, possible)?;
        let mut pubs: Vec<String> = pubs.iter().map(|p| p.as_ref().to_owned()).collect();
        pubs.sort();

        Ok(Self {
            required,
            pubs,
            possible,
        })
    }

    pub fn parse(address: &str) -> Result<Self, MultisigErr> {
        if !is_multisig(address) {
            return Err(MultisigErr::NotMultisig);
        }

        let fields: Vec<&str> = address.split(MULTISIG_SEPARATOR).collect();
        let required = parse_count(fields[0])?;
        let possible = parse_count(fields[fields.len() - 1])?;

        Self::new(required, &fields[1..fields.len() - 1], possible)
    }

    pub fn required(&self) -> u8 {
        self.required
    }

    pub fn possible(&self) -> u8 {
        self.possible
    }

    pub fn pubs(&self) -> &[String] {
        &self.pubs
    }

    /// Checks that every pub is a pubkeyhash address for the version.
    pub fn check_pubkeyhashes(&self, version: u8) -> Result<(), MultisigErr> {
        for pubkeyhash in &self.pubs {
            base58::check_decode(pubkeyhash, version)?;
        }
        Ok(())
    }
}

impl fmt::Display for MultisigAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.required)?;
        for p in &self.pubs {
            write!(f, "{MULTISIG_SEPARATOR}{p}")?;
        }
        write!(f, "{MULTISIG_SEPARATOR}{}", self.possible)
    }
}

fn parse_count(field: &str) -> Result<u8, MultisigErr> {
    let n: i64 = field
        .trim()
        .parse()
        .map_err(|_| MultisigErr::NotInteger(field.to_owned()))?;

    // Out of range counts are a threshold error, not a parse error
    Ok(u8::try_from(n).unwrap_or(u8::MAX))
}

/// Validates signature counts against the pubs.
pub fn validate<S>(required: u8, pubs: &[S], possible: u8) -> Result<(), MultisigErr> {
    let err = MultisigErr::InvalidThreshold {
        required,
        possible,
        pubs: pubs.len(),
    };

    if !(MULTISIG_MIN_REQUIRED..=MULTISIG_MAX_REQUIRED).contains(&required) {
        return Err(err);
    }

    if !(MULTISIG_MIN_POSSIBLE..=MULTISIG_MAX_POSSIBLE).contains(&possible) {
        return Err(err);
    }

    if possible as usize != pubs.len() {
        return Err(err);
    }

    Ok(())
}

/// Builds the canonical descriptor string
pub fn construct<S: AsRef<str>>(
    required: u8,
    pubs: &[S],
    possible: u8,
) -> Result<String, MultisigErr> {
    Ok(MultisigAddress::new(required, pubs, possible)?.to_string())
}

/// Splits a descriptor into its counts and sorted pubs
pub fn extract(address: &str) -> Result<(u8, Vec<String>, u8), MultisigErr> {
    let multisig = MultisigAddress::parse(address)?;
    Ok((multisig.required, multisig.pubs, multisig.possible))
}

/// Structural check only, the address is not validated.
#[inline]
#[must_use]
pub fn is_multisig(address: &str) -> bool {
    address.contains(MULTISIG_SEPARATOR)
}

/// Returns the canonical form of a multisig address. Single addresses are
/// returned unchanged.
pub fn canonical_address(address: &str, version: u8) -> Result<String, MultisigErr> {
    if !is_multisig(address) {
        return Ok(address.to_owned());
    }

    let multisig = MultisigAddress::parse(address)?;
    multisig.check_pubkeyhashes(version)?;
    Ok(multisig.to_string())
}

/// Returns the sorted pubkeyhashes of a multisig address
pub fn pubkeyhash_array(address: &str, version: u8) -> Result<Vec<String>, MultisigErr> {
    let multisig = MultisigAddress::parse(address)?;
    multisig.check_pubkeyhashes(version)?;
    Ok(multisig.pubs)
}
