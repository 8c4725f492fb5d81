// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Protocol change activation.
//!
//! Rule changes are keyed by name and activate at a block height on mainnet.
//! On testnet every change is active from genesis so that the whole history
//! validates under the latest rules.

use crate::chain::Network;
use log::*;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

/// Activation table shipped with the node.
pub const DEFAULT_PROTOCOL_CHANGES: &str = include_str!("protocol_changes.json");

/// Rule changes consulted by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolChange {
    ContractsOnlyXcpBalances,
    NumericAssetNames,
    HotfixNumericAssets,
}

impl ProtocolChange {
    pub const ALL: [ProtocolChange; 3] = [
        Self::ContractsOnlyXcpBalances,
        Self::NumericAssetNames,
        Self::HotfixNumericAssets,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ContractsOnlyXcpBalances => "contracts_only_xcp_balances",
            Self::NumericAssetNames => "numeric_asset_names",
            Self::HotfixNumericAssets => "hotfix_numeric_assets",
        }
    }
}

impl fmt::Display for ProtocolChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ProtocolChangeEntry {
    block_index: u32,
}

#[derive(Debug)]
pub enum ProtocolErr {
    /// A change was queried that is not in the activation table
    UnknownChange(String),

    /// The activation table lacks a change the core depends on
    MissingChange(ProtocolChange),

    /// The activation table could not be parsed
    InvalidTable(String),

    /// The activation table could not be read
    Io(std::io::Error),
}

impl fmt::Display for ProtocolErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownChange(name) => write!(f, "unknown protocol change: {name}"),
            Self::MissingChange(change) => {
                write!(f, "protocol change table is missing {change}")
            }
            Self::InvalidTable(err) => write!(f, "invalid protocol change table: {err}"),
            Self::Io(err) => write!(f, "could not read protocol change table: {err}"),
        }
    }
}

impl std::error::Error for ProtocolErr {}

impl From<serde_json::Error> for ProtocolErr {
    fn from(other: serde_json::Error) -> Self {
        Self::InvalidTable(other.to_string())
    }
}

impl From<std::io::Error> for ProtocolErr {
    fn from(other: std::io::Error) -> Self {
        Self::Io(other)
    }
}

/// Resolves whether a rule change is active at a height. Immutable once built.
#[derive(Debug, Clone)]
pub struct ProtocolGate {
    network: Network,
    table: BTreeMap<String, u32>,
    activations: HashMap<ProtocolChange, u32>,
}

impl ProtocolGate {
    /// Builds a gate from a `name -> activation height` table. Fails if any
    /// change known to the core has no activation height.
    pub fn new(network: Network, table: BTreeMap<String, u32>) -> Result<Self, ProtocolErr> {
        let mut activations = HashMap::with_capacity(ProtocolChange::ALL.len());

        for change in ProtocolChange::ALL {
            let height = table
                .get(change.name())
                .ok_or(ProtocolErr::MissingChange(change))?;
            activations.insert(change, *height);
        }

        Ok(Self {
            network,
            table,
            activations,
        })
    }

    /// Builds a gate from the JSON activation table format
    pub fn from_json(network: Network, json: &str) -> Result<Self, ProtocolErr> {
        let entries: BTreeMap<String, ProtocolChangeEntry> = serde_json::from_str(json)?;
        let table = entries
            .into_iter()
            .map(|(name, entry)| (name, entry.block_index))
            .collect();
        Self::new(network, table)
    }

    pub fn from_file<P: AsRef<Path>>(network: Network, path: P) -> Result<Self, ProtocolErr> {
        let json = fs::read_to_string(path.as_ref())?;
        debug!(
            "Loading protocol changes from {}",
            path.as_ref().display()
        );
        Self::from_json(network, &json)
    }

    pub fn with_default_changes(network: Network) -> Result<Self, ProtocolErr> {
        Self::from_json(network, DEFAULT_PROTOCOL_CHANGES)
    }

    #[inline]
    #[must_use]
    pub fn enabled(&self, change: ProtocolChange, height: u32) -> bool {
        if self.network.is_testnet() {
            return true;
        }

        height >= self.activation_height(change)
    }

    /// Same as [`ProtocolGate::enabled`] for a change given by name. The name
    /// is looked up before the network is considered so an unknown name fails
    /// on every network.
    pub fn enabled_by_name(&self, name: &str, height: u32) -> Result<bool, ProtocolErr> {
        let activation = self
            .table
            .get(name)
            .ok_or_else(|| ProtocolErr::UnknownChange(name.to_owned()))?;

        Ok(self.network.is_testnet() || height >= *activation)
    }

    #[must_use]
    pub fn activation_height(&self, change: ProtocolChange) -> u32 {
        // Every variant is inserted by the constructor
        self.activations.get(&change).copied().unwrap_or(u32::MAX)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn changes(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.table.iter().map(|(name, h)| (name.as_str(), *h))
    }
}
