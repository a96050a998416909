// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page number formatting.

use bindery_core::NumberStyle;

const ROMAN_TABLE: [(u32, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Largest value with a standard Roman numeral.
pub const MAX_ROMAN: u32 = 3999;

/// Upper-case Roman numeral for `n` in `1..=3999`; `None` outside that range.
pub fn to_roman(n: u32) -> Option<String> {
    if n == 0 || n > MAX_ROMAN {
        return None;
    }
    let mut remaining = n;
    let mut numeral = String::new();
    for (value, symbol) in ROMAN_TABLE {
        while remaining >= value {
            numeral.push_str(symbol);
            remaining -= value;
        }
    }
    Some(numeral)
}

/// Label printed for page `number` of `total` in `style`.
///
/// Roman styles fall back to Arabic digits outside `1..=3999`.
pub fn format_page_number(number: u32, total: u32, style: NumberStyle) -> String {
    match style {
        NumberStyle::Arabic => number.to_string(),
        NumberStyle::RomanUpper => to_roman(number).unwrap_or_else(|| number.to_string()),
        NumberStyle::RomanLower => to_roman(number)
            .map(|numeral| numeral.to_ascii_lowercase())
            .unwrap_or_else(|| number.to_string()),
        NumberStyle::PageOfTotal => format!("Page {number} of {total}"),
    }
}
