// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Binary encoding of persisted ledger rows.

use bincode::config::Config;

pub const CODEC_BYTES_LIMIT: usize = 1_000_000;

fn config() -> impl Config {
    bincode::config::standard()
        .with_little_endian()
        .with_variable_int_encoding()
        .with_limit::<CODEC_BYTES_LIMIT>()
}

pub fn encode_to_vec<T: bincode::Encode>(val: &T) -> Result<Vec<u8>, bincode::error::EncodeError> {
    bincode::encode_to_vec(val, config())
}

pub fn decode<T: bincode::Decode>(bytes: &[u8]) -> Result<T, bincode::error::DecodeError> {
    bincode::decode_from_slice(bytes, config()).map(|r| r.0)
}
