//! Price text normalization.

use crate::error::WatchError;

/// Converts raw extracted price text into a numeric value.
///
/// Currency symbols and whitespace are stripped; only digits and the
/// `,`/`.` separators survive. The final separator is treated as the
/// decimal separator iff exactly two digits follow it; every other
/// separator is thousands grouping. So `"$1,234.56"` and `"1.234,56"`
/// both normalize to `1234.56`, while `"1.234"` is `1234`.
///
/// Pure function; fails with `PriceParse` when no digit survives.
pub fn normalize_price(raw: &str) -> Result<f64, WatchError> {
    let parse_error = || WatchError::PriceParse { raw: raw.to_string() };

    let cleaned: String =
        raw.chars().filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.')).collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(parse_error());
    }

    let normalized = match cleaned.rfind([',', '.']) {
        Some(pos) => {
            let fraction = &cleaned[pos + 1..];
            if fraction.len() == 2 && fraction.chars().all(|c| c.is_ascii_digit()) {
                format!("{}.{}", digits_only(&cleaned[..pos]), fraction)
            } else {
                digits_only(&cleaned)
            }
        }
        None => cleaned,
    };

    normalized.parse::<f64>().map_err(|_| parse_error())
}

fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}
