//! Upstream (WooCommerce) order shape and the normalized output shape.
//!
//! Only the upstream fields this crate reads are modelled. Deserialization is lenient:
//! WooCommerce plugins are inconsistent about strings vs numbers, so ids and amounts accept
//! both, and every field defaults when missing or `null`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOrder {
    #[serde(deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    #[serde(deserialize_with = "lenient_string")]
    pub number: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    pub total: Option<Value>,
    pub subtotal: Option<Value>,
    pub shipping_total: Option<Value>,
    pub discount_total: Option<Value>,
    pub total_tax: Option<Value>,
    #[serde(deserialize_with = "lenient_string")]
    pub date_created: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub date_created_gmt: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub date_paid: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub date_paid_gmt: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub date_completed: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub date_completed_gmt: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub customer_email: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub billing: RawAddress,
    #[serde(deserialize_with = "null_as_default")]
    pub shipping: RawAddress,
    #[serde(deserialize_with = "null_as_default")]
    pub line_items: Vec<RawLineItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub shipping_lines: Vec<RawShippingLine>,
    #[serde(deserialize_with = "null_as_default")]
    pub meta_data: Vec<RawMeta>,
}

impl RawOrder {
    /// The human-facing order number (`number`, falling back to the numeric id).
    #[must_use]
    pub fn display_number(&self) -> String {
        match self.number.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => self.id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAddress {
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub company: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub address_1: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub address_2: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub postcode: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLineItem {
    #[serde(deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub sku: Option<String>,
    pub quantity: Option<Value>,
    pub subtotal: Option<Value>,
    pub total: Option<Value>,
    pub total_tax: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawShippingLine {
    #[serde(deserialize_with = "lenient_string")]
    pub method_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub method_title: Option<String>,
    pub total: Option<Value>,
    pub total_tax: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMeta {
    #[serde(deserialize_with = "lenient_string")]
    pub key: Option<String>,
    pub value: Value,
}

/// Stable output entity returned to tool callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedOrder {
    pub ok: bool,
    pub id: Option<u64>,
    pub number: String,
    pub status: String,
    pub currency: String,
    pub totals: Totals,
    pub created: Option<String>,
    pub paid: Option<String>,
    pub completed: Option<String>,
    pub customer: Customer,
    pub addresses: Addresses,
    pub items: Vec<Item>,
    pub shipping_lines: Vec<ShippingLine>,
    pub tracking: Vec<Tracking>,
    pub eta: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub items_total: String,
    pub subtotal: String,
    pub shipping: String,
    pub discount: String,
    pub tax: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Addresses {
    pub billing: BillingAddress,
    pub shipping: ShippingAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingAddress {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: Option<u64>,
    pub name: String,
    pub sku: String,
    pub qty: i64,
    pub subtotal: String,
    pub total: String,
    pub total_tax: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingLine {
    pub method_id: String,
    pub method_title: String,
    pub total: String,
    pub total_tax: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tracking {
    pub tracking_number: Option<String>,
    pub provider: Option<String>,
    pub link: Option<String>,
    pub date_shipped: Option<String>,
}

/// Render a JSON scalar as a string; `null`, arrays and objects become `None`.
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
