// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Supply accounting over committed ledger state.
//!
//! Created quantities come from valid issuances and, for XCP, from valid
//! burns. Destroyed quantities come from valid destructions and, for XCP,
//! from issuance and dividend fees. The supply of an asset must always equal
//! what its holders have in balances and escrows.

use crate::chain::{LedgerBackend, LedgerBackendErr, LedgerSnapshot};
use crate::consensus::*;
use crate::primitives::AssetId;
use log::*;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug)]
pub enum SupplyErr {
    /// Supply does not match the held total
    Mismatch {
        asset: AssetId,
        supply: Money,
        held: Money,
    },

    /// Backend error
    Backend(LedgerBackendErr),
}

impl fmt::Display for SupplyErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch {
                asset,
                supply,
                held,
            } => write!(
                f,
                "supply of asset {asset} is {supply} but holders have {held}"
            ),
            Self::Backend(err) => write!(f, "backend error: {err}"),
        }
    }
}

impl std::error::Error for SupplyErr {}

impl From<LedgerBackendErr> for SupplyErr {
    fn from(other: LedgerBackendErr) -> Self {
        Self::Backend(other)
    }
}

/// Quantity of an asset held by an address, either as a balance or inside
/// an escrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub address: String,
    pub quantity: u64,

    /// `None` for balances
    pub escrow: Option<String>,
}

/// Read-only view computing supplies from the records of a backend. Every
/// query reads a single committed snapshot.
pub struct SupplyAccountant<'a, B: LedgerBackend> {
    backend: &'a B,
}

impl<'a, B: LedgerBackend> SupplyAccountant<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Total ever created of the asset
    pub fn created(&self, asset: AssetId) -> Result<Money, SupplyErr> {
        let snapshot = self.backend.snapshot()?;
        Ok(creations(&snapshot).get(&asset).copied().unwrap_or(0))
    }

    /// Total ever destroyed of the asset
    pub fn destroyed(&self, asset: AssetId) -> Result<Money, SupplyErr> {
        let snapshot = self.backend.snapshot()?;
        Ok(destructions(&snapshot).get(&asset).copied().unwrap_or(0))
    }

    pub fn supply(&self, asset: AssetId) -> Result<Money, SupplyErr> {
        let snapshot = self.backend.snapshot()?;
        Ok(supply_of(&snapshot, asset))
    }

    /// Created quantity of every asset. XCP is always present.
    pub fn creations(&self) -> Result<BTreeMap<AssetId, Money>, SupplyErr> {
        Ok(creations(&self.backend.snapshot()?))
    }

    /// Destroyed quantity of every asset. XCP is always present.
    pub fn destructions(&self) -> Result<BTreeMap<AssetId, Money>, SupplyErr> {
        Ok(destructions(&self.backend.snapshot()?))
    }

    /// Supply of every asset that was ever created
    pub fn supplies(&self) -> Result<BTreeMap<AssetId, Money>, SupplyErr> {
        Ok(supplies(&self.backend.snapshot()?))
    }

    /// Every balance and escrow holding the asset
    pub fn holders(&self, asset: AssetId) -> Result<Vec<Holding>, SupplyErr> {
        Ok(holders(&self.backend.snapshot()?, asset))
    }

    pub fn held(&self, asset: AssetId) -> Result<Money, SupplyErr> {
        Ok(held(&self.backend.snapshot()?, asset))
    }

    /// Checks that the supply of the asset equals the held total.
    pub fn reconcile(&self, asset: AssetId) -> Result<Money, SupplyErr> {
        let snapshot = self.backend.snapshot()?;
        let supply = supply_of(&snapshot, asset);
        check(asset, supply, held(&snapshot, asset))?;

        debug!("Reconciled asset {asset} with supply {supply}");
        Ok(supply)
    }

    /// Reconciles every asset, stopping at the first mismatch.
    pub fn reconcile_all(&self) -> Result<BTreeMap<AssetId, Money>, SupplyErr> {
        let snapshot = self.backend.snapshot()?;
        let supplies = supplies(&snapshot);

        for (asset, supply) in &supplies {
            check(*asset, *supply, held(&snapshot, *asset))?;
        }

        info!(
            "Reconciled {} assets at block {:?}",
            supplies.len(),
            snapshot.last_block
        );
        Ok(supplies)
    }
}

fn check(asset: AssetId, supply: Money, held: Money) -> Result<(), SupplyErr> {
    if supply != held {
        warn!("Supply mismatch for asset {asset}: supply {supply}, held {held}");
        return Err(SupplyErr::Mismatch {
            asset,
            supply,
            held,
        });
    }

    Ok(())
}

fn creations(snapshot: &LedgerSnapshot) -> BTreeMap<AssetId, Money> {
    let mut creations = BTreeMap::new();

    let earned: Money = snapshot
        .burns
        .iter()
        .filter(|b| b.status.is_valid())
        .map(|b| Money::from(b.earned))
        .sum();
    creations.insert(XCP_ID, earned);

    for issuance in &snapshot.issuances {
        if issuance.status.is_valid() {
            *creations.entry(issuance.asset).or_insert(0) += Money::from(issuance.quantity);
        }
    }

    creations
}

fn destructions(snapshot: &LedgerSnapshot) -> BTreeMap<AssetId, Money> {
    let mut destructions = BTreeMap::new();

    let fees: Money = snapshot
        .issuances
        .iter()
        .filter(|i| i.status.is_valid())
        .map(|i| Money::from(i.fee_paid))
        .chain(
            snapshot
                .dividends
                .iter()
                .filter(|d| d.status.is_valid())
                .map(|d| Money::from(d.fee_paid)),
        )
        .sum();
    destructions.insert(XCP_ID, fees);

    for destruction in &snapshot.destructions {
        if destruction.status.is_valid() {
            *destructions.entry(destruction.asset).or_insert(0) +=
                Money::from(destruction.quantity);
        }
    }

    destructions
}

fn supplies(snapshot: &LedgerSnapshot) -> BTreeMap<AssetId, Money> {
    let destructions = destructions(snapshot);

    creations(snapshot)
        .into_iter()
        .map(|(asset, created)| {
            let destroyed = destructions.get(&asset).copied().unwrap_or(0);
            (asset, created - destroyed)
        })
        .collect()
}

fn supply_of(snapshot: &LedgerSnapshot, asset: AssetId) -> Money {
    let created = creations(snapshot).get(&asset).copied().unwrap_or(0);
    let destroyed = destructions(snapshot).get(&asset).copied().unwrap_or(0);
    created - destroyed
}

fn holders(snapshot: &LedgerSnapshot, asset: AssetId) -> Vec<Holding> {
    let balances = snapshot
        .balances
        .iter()
        .filter(|b| b.asset == asset)
        .map(|b| Holding {
            address: b.address.clone(),
            quantity: b.quantity,
            escrow: None,
        });

    let escrows = snapshot
        .escrows
        .iter()
        .filter(|e| e.key.asset == asset)
        .map(|e| Holding {
            address: e.key.address.clone(),
            quantity: e.quantity,
            escrow: Some(e.key.escrow_id.clone()),
        });

    balances.chain(escrows).collect()
}

fn held(snapshot: &LedgerSnapshot, asset: AssetId) -> Money {
    let balances: Money = snapshot
        .balances
        .iter()
        .filter(|b| b.asset == asset)
        .map(|b| Money::from(b.quantity))
        .sum();

    let escrowed: Money = snapshot
        .escrows
        .iter()
        .filter(|e| e.key.asset == asset)
        .map(|e| Money::from(e.quantity))
        .sum();

    balances + escrowed
}
