//! Serde for monetary amounts.
//!
//! Amounts go out as JSON numbers when an `f64` carries them exactly and as
//! decimal strings otherwise; both forms are accepted on the way in.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    match exact_f64(amount) {
        Some(value) => serializer.serialize_f64(value),
        None => serializer.serialize_str(&amount.to_string()),
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    <Decimal as Deserialize>::deserialize(deserializer)
}

/// The `f64` form of `amount`, if reading it back yields the same value
fn exact_f64(amount: &Decimal) -> Option<f64> {
    let value = amount.to_f64()?;
    let parsed = Decimal::from_str(&value.to_string()).ok()?;
    (parsed == *amount).then_some(value)
}
