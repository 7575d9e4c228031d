//! Shared formatting and parsing helpers.

use chrono::format::{Item, StrftimeItems};
use chrono::{Duration, NaiveDate};
use std::fmt::Write;

/// Fallback used when a configured date format cannot be rendered.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Formats a count with a compact suffix: `1500` → `1.5K`, `2000000` → `2M`.
///
/// Zero formats as `0`; non-finite values format as an empty string.
pub fn format_compact(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    // the suffix follows the value as displayed, so 999_950 reads 1M
    let mut scaled = value;
    let mut suffix = 0;
    while suffix + 1 < COMPACT_SUFFIXES.len() && round_tenths(scaled.abs()) >= 1_000.0 {
        scaled /= 1_000.0;
        suffix += 1;
    }
    format!("{}{}", trim_decimal(scaled, 1), COMPACT_SUFFIXES[suffix])
}

const COMPACT_SUFFIXES: [&str; 3] = ["", "K", "M"];

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Formats a percentage tick: `12.5` → `12.5%`, `0` → `0%`.
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    format!("{}%", trim_decimal(value, 1))
}

/// Renders a number with at most `decimals` digits, dropping trailing zeros.
fn trim_decimal(value: f64, decimals: usize) -> String {
    let rendered = format!("{value:.decimals$}");
    let trimmed = if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.')
    } else {
        rendered.as_str()
    };
    // "-0" shows up for tiny negative values
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Formats an x-axis tick expressed as a day offset from `origin`.
pub fn format_date_tick(origin: NaiveDate, offset_days: f64, format: &str) -> String {
    // NaiveDate spans roughly ±95 million days
    if !offset_days.is_finite() || offset_days.abs() > 1.0e8 {
        return String::new();
    }
    let Some(date) = origin.checked_add_signed(Duration::days(offset_days.round() as i64)) else {
        return String::new();
    };
    format_date(date, format)
}

/// Formats a date with a strftime pattern, falling back to ISO on bad patterns.
pub fn format_date(date: NaiveDate, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_ok() {
        out
    } else {
        date.format(ISO_DATE_FORMAT).to_string()
    }
}

/// Returns true when chrono accepts every item of a strftime pattern.
pub fn is_valid_date_format(format: &str) -> bool {
    !format.is_empty() && StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

/// Parses `#rrggbb` (or `rrggbb`) into its components.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
