// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! # Tokenlayer
//! Deterministic core of a token protocol layered on top of a Bitcoin-like
//! base chain. Every node replaying the same blocks must arrive at exactly the
//! same balances, so everything in here is a pure function of its inputs and
//! the protocol change table.
//!
//! ## Components
//! * **Protocol gate**: answers whether a named rule change is active at a
//!   block height. Changes activate at fixed heights on mainnet and from
//!   genesis on testnet.
//! * **Codecs**: Base58Check addresses, canonical `m_addr1_..._addrN_n`
//!   multisig descriptors, bijective asset name and id conversion and
//!   display quantities.
//! * **Ledger**: per-address, per-asset balances changed only through debit
//!   and credit. Balances never go negative, saturate at `2^63 - 1` and every
//!   block is applied atomically along with its audit trail.
//! * **Supply accounting**: created and destroyed totals per asset which must
//!   reconcile with the balances and escrows of the holders.
//!
//! ## Storage
//! The ledger runs over any [`chain::LedgerBackend`]. A memory backend is
//! always available, a RocksDB backend is enabled with the `disk` feature.

pub mod chain;
pub mod codec;
pub mod consensus;
pub mod ledger;
pub mod primitives;
pub mod settings;
pub mod supply;
