// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::base58::{self, Base58Err};
use crate::primitives::multisig::{self, MultisigAddress, MultisigErr};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressErr {
    Base58(Base58Err),
    Multisig(MultisigErr),
}

impl fmt::Display for AddressErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base58(err) => write!(f, "invalid address: {err}"),
            Self::Multisig(err) => write!(f, "invalid multisig address: {err}"),
        }
    }
}

impl std::error::Error for AddressErr {}

impl From<Base58Err> for AddressErr {
    fn from(other: Base58Err) -> Self {
        Self::Base58(other)
    }
}

impl From<MultisigErr> for AddressErr {
    fn from(other: MultisigErr) -> Self {
        Self::Multisig(other)
    }
}

/// A validated address on a network.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// Base58Check pubkeyhash address
    Single(String),

    /// Canonical multisig descriptor over pubkeyhash addresses
    Multisig(MultisigAddress),
}

impl Address {
    pub fn parse(address: &str, version: u8) -> Result<Self, AddressErr> {
        if multisig::is_multisig(address) {
            let multisig = MultisigAddress::parse(address)?;
            multisig.check_pubkeyhashes(version)?;
            Ok(Self::Multisig(multisig))
        } else {
            base58::check_decode(address, version)?;
            Ok(Self::Single(address.to_owned()))
        }
    }

    pub fn is_multisig(&self) -> bool {
        matches!(self, Self::Multisig(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(address) => f.write_str(address),
            Self::Multisig(multisig) => write!(f, "{multisig}"),
        }
    }
}

/// Validates a single or multisig address against the network version byte
pub fn validate_address(address: &str, version: u8) -> Result<(), AddressErr> {
    Address::parse(address, version).map(|_| ())
}
