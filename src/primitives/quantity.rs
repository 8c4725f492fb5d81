// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::consensus::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityErr {
    /// Text is not a decimal number
    NotANumber,

    /// Divisible quantity with more than eight decimal places
    TooPrecise,

    /// Fractional quantity of an indivisible asset
    Fractional,

    /// Negative or above the balance ceiling
    OutOfRange,
}

impl fmt::Display for QuantityErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber => write!(f, "not a number"),
            Self::TooPrecise => write!(
                f,
                "divisible assets have only {UNIT_DECIMALS} decimal places of precision"
            ),
            Self::Fractional => write!(f, "fractional quantities of indivisible assets"),
            Self::OutOfRange => write!(f, "quantity out of range"),
        }
    }
}

impl std::error::Error for QuantityErr {}

/// Parses a display quantity into base units.
pub fn value_in(quantity: &str, divisible: bool) -> Result<u64, QuantityErr> {
    let d = Decimal::from_str(quantity.trim()).map_err(|_| QuantityErr::NotANumber)?;

    let units = if divisible {
        let units = d
            .checked_mul(Decimal::from(UNIT))
            .ok_or(QuantityErr::OutOfRange)?;

        if !units.fract().is_zero() {
            return Err(QuantityErr::TooPrecise);
        }

        units
    } else {
        if !d.fract().is_zero() {
            return Err(QuantityErr::Fractional);
        }

        d
    };

    let units = units.trunc().to_u64().ok_or(QuantityErr::OutOfRange)?;

    if !quantity_check(units) {
        return Err(QuantityErr::OutOfRange);
    }

    Ok(units)
}

/// Formats base units for display. Divisible quantities always show a
/// decimal point.
#[must_use]
pub fn value_out(quantity: u64, divisible: bool) -> String {
    if !divisible {
        return quantity.to_string();
    }

    let d = Decimal::from_i128_with_scale(i128::from(quantity), UNIT_DECIMALS).normalize();

    if d.fract().is_zero() {
        format!("{d}.0")
    } else {
        d.to_string()
    }
}
