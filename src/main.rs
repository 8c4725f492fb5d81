// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use anyhow::anyhow;
use log::*;
use mimalloc::MiMalloc;
use std::env;
use std::sync::Arc;
use tokenlayer::chain::*;
use tokenlayer::consensus::ProtocolGate;
use tokenlayer::ledger::LedgerStore;
use tokenlayer::primitives::*;
use tokenlayer::settings::SETTINGS;
use tokenlayer::supply::SupplyAccountant;
use tracing_subscriber::prelude::*;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USAGE: &str = "Usage: tokenlayer <command>

Commands:
    supplies                      Print and reconcile the supply of every asset
    asset-id <name> <height>      Print the id of an asset name
    asset-name <id> <height>      Print the name of an asset id
    validate-address <address>    Check a single or multisig address";

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = ChainConfig::from_network_name(&SETTINGS.node.network_name)
        .map_err(|err| anyhow!("{err}: {}", SETTINGS.node.network_name))?;

    let gate = match &SETTINGS.protocol.changes_file {
        Some(path) => ProtocolGate::from_file(config.network(), path)?,
        None => ProtocolGate::with_default_changes(config.network())?,
    };
    let gate = Arc::new(gate);
    let args: Vec<String> = env::args().skip(1).collect();

    #[cfg(feature = "disk")]
    if !SETTINGS.node.memory_only {
        info!(
            "Running Tokenlayer v{} on {}",
            env!("CARGO_PKG_VERSION"),
            config.network_name()
        );
        let db = tokenlayer::chain::backend::create_rocksdb_backend()?;
        return run(LedgerStore::new(DiskBackend::new(db), gate), &config, &args);
    }

    info!(
        "Running Tokenlayer v{} on {} in memory only mode",
        env!("CARGO_PKG_VERSION"),
        config.network_name()
    );
    run(LedgerStore::new(MemoryBackend::new(), gate), &config, &args)
}

fn run<B: LedgerBackend>(
    store: LedgerStore<B>,
    config: &ChainConfig,
    args: &[String],
) -> anyhow::Result<()> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["supplies"] => print_supplies(&store),
        ["asset-id", name, height] => {
            println!("{}", store.get_asset_id(name, height.parse()?)?);
            Ok(())
        }
        ["asset-name", id, height] => {
            println!("{}", store.get_asset_name(id.parse()?, height.parse()?)?);
            Ok(())
        }
        ["validate-address", address] => {
            let address = Address::parse(address, config.address_version())?;
            let kind = if address.is_multisig() {
                "multisig"
            } else {
                "single"
            };
            println!("{address} is a valid {kind} address on {}", config.network_name());
            Ok(())
        }
        _ => {
            println!("{USAGE}");
            Ok(())
        }
    }
}

fn print_supplies<B: LedgerBackend>(store: &LedgerStore<B>) -> anyhow::Result<()> {
    let height = store.backend().last_block()?.unwrap_or(0);
    let accountant = SupplyAccountant::new(store.backend());

    for (asset, supply) in accountant.supplies()? {
        let name = store.get_asset_name(asset, height)?;
        let supply = match u64::try_from(supply) {
            Ok(supply) => value_out(supply, store.is_divisible(asset)?),
            Err(_) => supply.to_string(),
        };
        println!("{name}\t{supply}");
    }

    let reconciled = accountant.reconcile_all()?;
    info!("Supplies of {} assets match their holders", reconciled.len());
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
