//! Price string normalization.

use serde_json::Value;

/// Strip everything but ASCII digits and read the rest as won.
///
/// No magnitude check; callers bound the value themselves.
pub fn parse_price(text: Option<&str>) -> Option<u64> {
    let digits: String = text?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// `6000` -> `"6,000"`.
pub fn format_won(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Read a price out of a JSON value.
///
/// Numbers are taken at face value (`15000.0` is 15000). Strings that are a
/// plain decimal are read the same way, anything else goes through
/// [`parse_price`].
pub(crate) fn json_price(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<f64>() {
                Ok(f) if f >= 0.0 && f.is_finite() => Some(f.round() as u64),
                _ => parse_price(Some(trimmed)),
            }
        }
        _ => None,
    }
}
