//! Sensor markup rendering.
//!
//! Format per channel, concatenated with no separators:
//! `<SPEEDTEST><CHANNEL>..</CHANNEL><SPEED>..</SPEED><UNIT>..</UNIT></SPEEDTEST>`

use crate::normalize::{OutputRow, MAX_PRECISION};

/// Render one block. Speeds are printed with exactly `precision` decimals.
pub fn render_row(row: &OutputRow, precision: u8) -> String {
    let decimals = usize::from(precision.min(MAX_PRECISION));
    format!(
        "<SPEEDTEST><CHANNEL>{}</CHANNEL><SPEED>{:.*}</SPEED><UNIT>{}</UNIT></SPEEDTEST>",
        escape(row.channel.as_str()),
        decimals,
        row.value,
        escape(&row.unit)
    )
}

/// Render the full payload in row order.
pub fn render_rows(rows: &[OutputRow], precision: u8) -> String {
    rows.iter().map(|row| render_row(row, precision)).collect()
}

/// Escape characters that would break the markup. Server names come from a
/// remote list and may contain `&`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
