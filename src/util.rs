// Parsing and formatting helpers.
//
// Everything that turns loosely-typed source cells into numbers, and numbers
// into display strings, lives here so the engine only sees clean values.
use crate::types::RawNumber;
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

/// Largest ACV accepted for a single record.
pub const MAX_RECORD_ACV: f64 = 1e15;

/// Largest opportunity count accepted for a single record.
pub const MAX_RECORD_COUNT: u64 = u32::MAX as u64;

fn number_from_raw(raw: Option<&RawNumber>) -> Option<f64> {
    let v = match raw? {
        RawNumber::Num(n) => *n,
        RawNumber::Text(s) => parse_f64_safe(Some(s))?,
        RawNumber::Other(_) => return None,
    };
    if v.is_finite() && v >= 0.0 {
        Some(v)
    } else {
        None
    }
}

/// A usable amount: finite, not negative and at most `MAX_RECORD_ACV`.
pub fn amount_from_raw(raw: Option<&RawNumber>) -> Option<f64> {
    number_from_raw(raw).filter(|v| *v <= MAX_RECORD_ACV)
}

/// A usable opportunity count: a whole number between 0 and
/// `MAX_RECORD_COUNT`.
pub fn count_from_raw(raw: Option<&RawNumber>) -> Option<u64> {
    let v = number_from_raw(raw)?;
    if v.fract() != 0.0 || v > MAX_RECORD_COUNT as f64 {
        return None;
    }
    Some(v as u64)
}

/// `round(part / whole * 100)`, or 0 when `whole` is not positive.
///
/// Rounds half away from zero, so 2/3 gives 67 and 1/8 gives 13.
pub fn percent_of_total(part: f64, whole: f64) -> u32 {
    if !part.is_finite() || !whole.is_finite() || whole <= 0.0 {
        return 0;
    }
    let pct = (part / whole * 100.0).round();
    if pct <= 0.0 {
        0
    } else {
        pct as u32
    }
}

/// Thousands-scaled money label: `125000.0` becomes `"$125K"`.
///
/// The K-scaled value is rounded to a whole number (half away from zero) and
/// gets `en` thousands separators, so `1_250_000.0` becomes `"$1,250K"`.
pub fn format_money(amount: f64) -> String {
    let thousands = if amount.is_finite() {
        (amount / 1000.0).round() as i64
    } else {
        0
    };
    format!("${}K", format_int(thousands))
}

pub fn format_percent(pct: u32) -> String {
    format!("{}%", pct)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimal places plus `en` thousands separators on the integer part.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
