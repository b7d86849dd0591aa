//! Caller email check against the order's billing/customer email.

use crate::model::RawOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    EmailMismatch,
}

/// Exact, case-insensitive comparison against every email on the order.
///
/// An order without any email never authorizes.
#[must_use]
pub fn authorize(order: &RawOrder, caller_email: &str) -> Authorization {
    let caller = normalize_email(caller_email);
    if caller.is_empty() {
        return Authorization::EmailMismatch;
    }

    if candidate_emails(order).iter().any(|e| *e == caller) {
        Authorization::Authorized
    } else {
        Authorization::EmailMismatch
    }
}

fn candidate_emails(order: &RawOrder) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(2);
    for e in [order.billing.email.as_deref(), order.customer_email.as_deref()]
        .into_iter()
        .flatten()
        .map(normalize_email)
    {
        if !e.is_empty() && !out.contains(&e) {
            out.push(e);
        }
    }
    out
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
