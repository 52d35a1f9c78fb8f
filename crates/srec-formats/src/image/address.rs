//! Address tokens and `term (+|-) term` expressions
//!
//! A term is a tag name or a hex number with an optional `0x`/`0X` prefix.
//! Expressions combine exactly two terms; nothing else is evaluated.

use std::collections::BTreeMap;

use super::error::{ImageError, Result};
use super::labels::Tag;

/// Parse a hex address with an optional `0x`/`0X` prefix
pub(crate) fn parse_hex_address(token: &str) -> Option<u32> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Resolve a token or a two-term expression
pub(crate) fn resolve(token: &str, tags: &BTreeMap<String, Tag>) -> Result<u32> {
    let token = token.trim();
    let unresolved = || ImageError::AddressResolution(token.to_string());

    let Some(split) = token.find(['+', '-']) else {
        return resolve_term(token, tags).ok_or_else(unresolved);
    };

    let (left, rest) = token.split_at(split);
    let (operator, right) = rest.split_at(1);
    let left = resolve_term(left.trim(), tags).ok_or_else(unresolved)?;
    let right = resolve_term(right.trim(), tags).ok_or_else(unresolved)?;

    match operator {
        "+" => left.checked_add(right),
        _ => left.checked_sub(right),
    }
    .ok_or_else(unresolved)
}

fn resolve_term(term: &str, tags: &BTreeMap<String, Tag>) -> Option<u32> {
    if term.is_empty() || term.contains(char::is_whitespace) {
        return None;
    }
    tags.get(term)
        .map(|tag| tag.address)
        .or_else(|| parse_hex_address(term))
}
