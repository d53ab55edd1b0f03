////////////////////////////////////////////////////////////////////////////////
// Markup lexer core library
////////////////////////////////////////////////////////////////////////////////
// Copyright 2022 Skylor R. Schermer
// This code is dual licenced using the MIT or Apache 2 license.
// See licence-mit.md and licence-apache.md for details.
////////////////////////////////////////////////////////////////////////////////
//! Byte classification.
//!
//! The DFA only ever dispatches on bytes in the ASCII range; every other
//! byte -- including every continuation or lead byte of a multi-byte
//! encoding -- is treated as an ordinary name/text byte so identifiers
//! and text runs carrying non-ASCII content pass through untouched.
////////////////////////////////////////////////////////////////////////////////

/// Returns true for the byte that opens an XML/HTML `Name` production:
/// an ASCII letter, `_`, or any non-ASCII byte.
#[must_use]
pub fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

/// Returns true for a byte that may continue a `Name` production once
/// started: anything [`is_name_start`] accepts, plus ASCII digits, `-`,
/// and `.`.
#[must_use]
pub fn is_name_char(b: u8) -> bool {
    is_name_start(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}

/// Returns true for XML whitespace: space, tab, `\r`, `\n`.
#[must_use]
pub fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}
