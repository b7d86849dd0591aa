//! Irreversible, deterministic PII masking for display.

const MARK: &str = "***";

/// Mask an email address: `john.doe@example.com` => `jo***@e***om`.
///
/// Input without an `@` is masked like a phone number so it is never echoed back whole.
#[must_use]
pub fn mask_email(email: &str) -> String {
    let email = email.trim();
    if email.is_empty() {
        return String::new();
    }
    let Some((local, domain)) = email.split_once('@') else {
        return mask_phone(email);
    };

    let local: Vec<char> = local.chars().collect();
    let masked_local = match local.len() {
        0 => "*".to_string(),
        1 | 2 => format!("{}*", local[0]),
        _ => format!("{}{MARK}", local[..2].iter().collect::<String>()),
    };

    let domain: Vec<char> = domain.chars().collect();
    let masked_domain = match domain.len() {
        0 => "*".to_string(),
        1..=3 => format!("{}**", domain[0]),
        n => format!(
            "{}{MARK}{}",
            domain[0],
            domain[n - 2..].iter().collect::<String>()
        ),
    };

    format!("{masked_local}@{masked_domain}")
}

/// Mask a phone number: keep the first and last two characters.
///
/// Values shorter than five characters are masked in full.
#[must_use]
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.trim().chars().collect();
    if chars.len() < 5 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}{MARK}{tail}")
}
