// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::consensus::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    #[must_use]
    pub fn is_testnet(&self) -> bool {
        matches!(self, Self::Testnet)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl FromStr for Network {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            _ => Err("invalid network name"),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Network wide constants. Two nodes on the same network
/// disagreeing on any of these are on different chains.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    network: Network,
    address_version: u8,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::new(Network::Testnet)
    }
}

impl ChainConfig {
    pub fn new(network: Network) -> Self {
        let address_version = match network {
            Network::Mainnet => ADDRESS_VERSION_MAINNET,
            Network::Testnet => ADDRESS_VERSION_TESTNET,
        };

        Self {
            network,
            address_version,
        }
    }

    pub fn from_network_name(network_name: &str) -> Result<Self, &'static str> {
        Ok(Self::new(network_name.parse()?))
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn network_name(&self) -> &'static str {
        self.network.name()
    }

    /// Version byte prefixed to every Base58Check address on this network
    pub fn address_version(&self) -> u8 {
        self.address_version
    }

    pub fn is_testnet(&self) -> bool {
        self.network.is_testnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_network_names() {
        assert_eq!("mainnet".parse::<Network>(), Ok(Network::Mainnet));
        assert_eq!("testnet".parse::<Network>(), Ok(Network::Testnet));
        assert!("devnet".parse::<Network>().is_err());
        assert_eq!(Network::Testnet.to_string(), "testnet");
    }

    #[test]
    fn it_selects_address_version() {
        assert_eq!(ChainConfig::new(Network::Mainnet).address_version(), 0x00);
        assert_eq!(ChainConfig::default().address_version(), 0x6f);
        assert!(ChainConfig::from_network_name("regtest").is_err());
    }
}
