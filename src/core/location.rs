//! Location assignment parsing.
//!
//! A product's refrigerator and shelf fields hold free text such as `"2, 5"`.
//! This module splits that text into atomic location identifiers.

use crate::models::{LocationKind, LocationToken};

/// Splits a raw assignment field into location identifiers.
///
/// Pieces are comma separated and trimmed; empty pieces are dropped. Order is
/// preserved and duplicates are kept. Blank input yields an empty vector.
#[must_use]
pub fn parse(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(normalize_identifier)
        .collect()
}

/// Parses one assignment field and tags every identifier with its source kind.
#[must_use]
pub fn parse_tokens(kind: LocationKind, raw: &str) -> Vec<LocationToken> {
    parse(raw)
        .into_iter()
        .map(|number| LocationToken { kind, number })
        .collect()
}

/// Tokens from both assignment fields, refrigerators first.
#[must_use]
pub fn tokens_for(refrigerator: &str, shelf: &str) -> Vec<LocationToken> {
    let mut tokens = parse_tokens(LocationKind::Refrigerator, refrigerator);
    tokens.extend(parse_tokens(LocationKind::Shelf, shelf));
    tokens
}

/// Canonical form of a single identifier: trimmed, leading zeros removed from
/// purely numeric identifiers (`"03"` and `"3"` name the same slot).
#[must_use]
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            return "0".to_string();
        }
        return stripped.to_string();
    }
    trimmed.to_string()
}
