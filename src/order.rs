//! Order payload carried in the `data` of an order-completed event.

use std::fmt;

use chrono::{DateTime, SecondsFormat};
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A completed purchase order.
///
/// `total_amount` is taken as the grand total; it is never checked against
/// the items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    pub order_id: OrderId,
    pub order_date: OrderDate,
    pub customer: Customer,
    pub order_items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub payment: Payment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_name: String,
    #[serde(deserialize_with = "whole_quantity")]
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: String,
    pub transaction_id: String,
}

/// Accepts `2` as well as `2.0`; fractional or negative counts are refused.
fn whole_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = number.as_u64() {
        return u32::try_from(n).map_err(|_| D::Error::custom(format!("quantity {n} out of range")));
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f) => Ok(f as u32),
        _ => Err(D::Error::custom(format!("invalid quantity {number}"))),
    }
}

/// Order identifier: shops send either a number or an opaque string.
///
/// Numbers are kept as sent, so `-5` or `1001.5` render verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Order date: a date string shown as sent, or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderDate {
    EpochMillis(i64),
    Text(String),
}

impl fmt::Display for OrderDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::EpochMillis(ms) => match DateTime::from_timestamp_millis(*ms) {
                Some(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
                None => write!(f, "{ms}"),
            },
        }
    }
}
