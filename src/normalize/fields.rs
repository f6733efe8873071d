//! Total field normalizers. None of these fail: bad input becomes `None`.

use serde_json::Value;

const DATE_SENTINELS: &[&str] = &["", "0000-00-00", "0000-00-00 00:00:00"];
const TRUE_WORDS: &[&str] = &["sim", "true", "1"];
const FALSE_WORDS: &[&str] = &["nao", "não", "false", "0"];

/// Keeps a date string unchanged unless it is empty or all zeros.
///
/// Anything that is not a string is `None`. The returned string is the
/// original, untrimmed input.
pub fn normalize_date(value: Option<&Value>) -> Option<String> {
    let raw = value?.as_str()?;
    let trimmed = raw.trim();

    if DATE_SENTINELS.contains(&trimmed) {
        return None;
    }
    if trimmed.chars().all(|c| matches!(c, '0' | '-' | ':' | ' ')) {
        return None;
    }
    Some(raw.to_string())
}

/// Three-valued boolean: `Some(true)`, `Some(false)` or unknown.
pub fn normalize_bool(value: Option<&Value>) -> Option<bool> {
    let text = match value? {
        Value::String(s) => s.trim().to_lowercase(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if TRUE_WORDS.contains(&text.as_str()) {
        Some(true)
    } else if FALSE_WORDS.contains(&text.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Monetary amount as `f64`.
pub fn normalize_amount(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Free text. Scalars render to text; null and containers are `None`.
pub fn normalize_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integer key of a history entry, from its string form.
///
/// Only all-ASCII-digit strings that fit in `i64` are keys.
pub fn normalize_child_key(candidate: &str) -> Option<i64> {
    if candidate.is_empty() || !candidate.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    candidate.parse().ok()
}
