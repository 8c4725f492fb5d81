// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

mod address;
mod asset;
pub mod base58;
pub mod multisig;
mod quantity;
mod records;

pub use crate::primitives::address::*;
pub use crate::primitives::asset::*;
pub use crate::primitives::base58::Base58Err;
pub use crate::primitives::multisig::{MultisigAddress, MultisigErr};
pub use crate::primitives::quantity::*;
pub use crate::primitives::records::*;
