//! Vietnamese text normalization and phone-list parsing.

use crate::error::{Error, Result};

/// Precomposed Vietnamese characters grouped by their ASCII base letter.
const TONE_GROUPS: &[(&str, char)] = &[
    ("àáạảãâầấậẩẫăằắặẳẵ", 'a'),
    ("èéẹẻẽêềếệểễ", 'e'),
    ("ìíịỉĩ", 'i'),
    ("òóọỏõôồốộổỗơờớợởỡ", 'o'),
    ("ùúụủũưừứựửữ", 'u'),
    ("ỳýỵỷỹ", 'y'),
    ("đ", 'd'),
    ("ÀÁẠẢÃÂẦẤẬẨẪĂẰẮẶẲẴ", 'A'),
    ("ÈÉẸẺẼÊỀẾỆỂỄ", 'E'),
    ("ÌÍỊỈĨ", 'I'),
    ("ÒÓỌỎÕÔỒỐỘỔỖƠỜỚỢỞỠ", 'O'),
    ("ÙÚỤỦŨƯỪỨỰỬỮ", 'U'),
    ("ỲÝỴỶỸ", 'Y'),
    ("Đ", 'D'),
];

/// Strip Vietnamese diacritics: `"Đà Nẵng"` becomes `"Da Nang"`.
///
/// Idempotent: ASCII input passes through unchanged, so applying it twice
/// yields the same result as once.
#[must_use]
pub fn remove_vietnamese_tones(input: &str) -> String {
    input
        .chars()
        // Drop stray combining marks left by decomposed input.
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .map(|c| {
            for (group, base) in TONE_GROUPS {
                if group.contains(c) {
                    return *base;
                }
            }
            c
        })
        .collect()
}

/// Parse a pasted multi-line phone list.
///
/// Blank lines and whitespace/punctuation-only separator lines are dropped;
/// surrounding punctuation is trimmed from each entry. An input with no
/// usable entries is a validation error so callers never submit an empty
/// batch.
pub fn parse_phone_list(input: &str) -> Result<Vec<String>> {
    let phones: Vec<String> = input
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().any(|c| c.is_ascii_digit()))
        .map(|line| {
            line.trim_matches(|c: char| !c.is_ascii_digit() && c != '+')
                .to_string()
        })
        .filter(|phone| !phone.is_empty())
        .collect();

    if phones.is_empty() {
        return Err(Error::message("phone list contains no phone numbers"));
    }
    Ok(phones)
}
