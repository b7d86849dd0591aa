//! Shipment tracking extraction from order `meta_data`.

use crate::model::{RawMeta, Tracking, scalar_to_string};
use serde_json::Value;
use tracing::debug;

/// Meta key written by the WooCommerce Shipment Tracking plugin.
pub const SHIPMENT_TRACKING_KEY: &str = "_wc_shipment_tracking_items";
const PLAIN_TRACKING_KEYS: [&str; 2] = ["tracking_number", "_tracking_number"];

/// Extract tracking entries. Malformed metadata yields an empty list, never an error.
#[must_use]
pub fn extract_tracking(meta: &[RawMeta]) -> Vec<Tracking> {
    if let Some(value) = find_meta(meta, SHIPMENT_TRACKING_KEY) {
        return match tracking_items(value) {
            Some(items) => items.iter().filter_map(map_item).collect(),
            None => {
                debug!(key = SHIPMENT_TRACKING_KEY, "unparseable tracking metadata ignored");
                Vec::new()
            }
        };
    }

    PLAIN_TRACKING_KEYS
        .iter()
        .find_map(|k| find_meta(meta, k).and_then(scalar_to_string))
        .filter(|n| !n.trim().is_empty())
        .map(|n| {
            vec![Tracking {
                tracking_number: Some(n),
                provider: None,
                link: None,
                date_shipped: None,
            }]
        })
        .unwrap_or_default()
}

fn find_meta<'a>(meta: &'a [RawMeta], key: &str) -> Option<&'a Value> {
    meta.iter()
        .find(|m| m.key.as_deref() == Some(key))
        .map(|m| &m.value)
}

/// The plugin stores either a real array or a JSON-serialized one.
fn tracking_items(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s).ok()? {
            Value::Array(items) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn map_item(item: &Value) -> Option<Tracking> {
    let obj = item.as_object()?;
    let field = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| obj.get(*k).and_then(scalar_to_string))
            .filter(|s| !s.is_empty())
    };
    Some(Tracking {
        tracking_number: field(&["tracking_number", "tracking_id"]),
        provider: field(&["tracking_provider", "custom_tracking_provider"]),
        link: field(&["custom_tracking_link"]),
        date_shipped: field(&["date_shipped"]),
    })
}
