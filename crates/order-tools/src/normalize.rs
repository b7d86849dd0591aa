//! Map a raw upstream order into the stable [`NormalizedOrder`] schema.

use crate::mask::{mask_email, mask_phone};
use crate::model::{
    Addresses, BillingAddress, Customer, Item, NormalizedOrder, RawAddress, RawLineItem,
    RawOrder, RawShippingLine, ShippingAddress, ShippingLine, Totals,
};
use crate::money::{amount_or_zero, format_amount, parse_amount, sum_amounts};
use crate::tracking::extract_tracking;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

#[must_use]
pub fn normalize(order: &RawOrder) -> NormalizedOrder {
    let billing = &order.billing;
    let customer_email = billing
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .or(order.customer_email.as_deref())
        .unwrap_or_default();

    NormalizedOrder {
        ok: true,
        id: order.id,
        number: order.display_number(),
        status: text(order.status.as_ref()),
        currency: text(order.currency.as_ref()),
        totals: totals(order),
        created: date(order.date_created.as_ref(), order.date_created_gmt.as_ref()),
        paid: date(order.date_paid.as_ref(), order.date_paid_gmt.as_ref()),
        completed: date(order.date_completed.as_ref(), order.date_completed_gmt.as_ref()),
        customer: Customer {
            email: mask_email(customer_email),
            name: full_name(billing),
        },
        addresses: Addresses {
            billing: billing_address(billing),
            shipping: shipping_address(&order.shipping),
        },
        items: order.line_items.iter().map(item).collect(),
        shipping_lines: order.shipping_lines.iter().map(shipping_line).collect(),
        tracking: extract_tracking(&order.meta_data),
        eta: None,
    }
}

fn totals(order: &RawOrder) -> Totals {
    let shipping = parse_amount(order.shipping_total.as_ref()).unwrap_or_else(|| {
        or_zero(
            sum_amounts(order.shipping_lines.iter().map(|s| s.total.as_ref())),
            "shipping",
        )
    });

    let items_total = match parse_amount(order.total.as_ref()) {
        Some(total) => or_zero(total.checked_sub(shipping), "items_total"),
        None => or_zero(
            sum_amounts(order.line_items.iter().map(|li| li.total.as_ref())),
            "items_total",
        ),
    };

    let subtotal = parse_amount(order.subtotal.as_ref()).unwrap_or_else(|| {
        or_zero(
            sum_amounts(order.line_items.iter().map(|li| li.subtotal.as_ref())),
            "subtotal",
        )
    });

    Totals {
        items_total: format_amount(items_total),
        subtotal: format_amount(subtotal),
        shipping: format_amount(shipping),
        discount: amount_or_zero(order.discount_total.as_ref()),
        tax: amount_or_zero(order.total_tax.as_ref()),
    }
}

/// Overflowing arithmetic on upstream amounts renders as zero.
fn or_zero(amount: Option<Decimal>, field: &'static str) -> Decimal {
    amount.unwrap_or_else(|| {
        debug!(field, "amount overflow, rendering as zero");
        Decimal::ZERO
    })
}

fn text(value: Option<&String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn date(local: Option<&String>, gmt: Option<&String>) -> Option<String> {
    local
        .into_iter()
        .chain(gmt)
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn full_name(address: &RawAddress) -> String {
    [address.first_name.as_deref(), address.last_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn billing_address(a: &RawAddress) -> BillingAddress {
    BillingAddress {
        first_name: text(a.first_name.as_ref()),
        last_name: text(a.last_name.as_ref()),
        company: text(a.company.as_ref()),
        address_1: text(a.address_1.as_ref()),
        address_2: text(a.address_2.as_ref()),
        city: text(a.city.as_ref()),
        state: text(a.state.as_ref()),
        postcode: text(a.postcode.as_ref()),
        country: text(a.country.as_ref()),
        email: mask_email(a.email.as_deref().unwrap_or_default()),
        phone: mask_phone(a.phone.as_deref().unwrap_or_default()),
    }
}

fn shipping_address(a: &RawAddress) -> ShippingAddress {
    ShippingAddress {
        first_name: text(a.first_name.as_ref()),
        last_name: text(a.last_name.as_ref()),
        company: text(a.company.as_ref()),
        address_1: text(a.address_1.as_ref()),
        address_2: text(a.address_2.as_ref()),
        city: text(a.city.as_ref()),
        state: text(a.state.as_ref()),
        postcode: text(a.postcode.as_ref()),
        country: text(a.country.as_ref()),
        phone: mask_phone(a.phone.as_deref().unwrap_or_default()),
    }
}

fn item(li: &RawLineItem) -> Item {
    Item {
        id: li.id,
        name: text(li.name.as_ref()),
        sku: text(li.sku.as_ref()),
        qty: quantity(li.quantity.as_ref()),
        subtotal: amount_or_zero(li.subtotal.as_ref()),
        total: amount_or_zero(li.total.as_ref()),
        total_tax: amount_or_zero(li.total_tax.as_ref()),
    }
}

fn quantity(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn shipping_line(s: &RawShippingLine) -> ShippingLine {
    ShippingLine {
        method_id: text(s.method_id.as_ref()),
        method_title: text(s.method_title.as_ref()),
        total: amount_or_zero(s.total.as_ref()),
        total_tax: amount_or_zero(s.total_tax.as_ref()),
    }
}
