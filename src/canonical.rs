//! Canonical JSON text and digest helpers.
//!
//! Every hash in the ledger is SHA-256 over the UTF-8 bytes of a canonical
//! JSON document:
//! - object keys sorted at every nesting level,
//! - compact output with `,` and `:` as the only separators,
//! - every character outside printable ASCII written as a lowercase `\uXXXX`
//!   escape (astral characters as a UTF-16 surrogate pair),
//! - floats in shortest round-trip form, integral floats keeping their `.0`,
//!   switching to `1e-05` / `1e+16` notation below `1e-4` and from `1e16` up.
//!
//! Key ordering comes from routing the record through [`serde_json::Value`],
//! whose object map is a `BTreeMap` as long as serde_json's `preserve_order`
//! feature stays off.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::Formatter;
use sha2::{Digest, Sha256};

/// Width of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Compact formatter that escapes everything outside `' '..='~'`.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(format_float(value).as_bytes())
    }
}

/// Shortest round-trip text for a finite float, in the layout ASCII-only JSON
/// encoders use: positional between `1e-4` and `1e16`, scientific with a signed
/// two-digit exponent outside that range.
fn format_float(value: f64) -> String {
    // `{:e}` yields the shortest digits, e.g. `-1.25e-7`.
    let sci = format!("{value:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if !(-4..16).contains(&exp) {
        let (lead, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() { String::new() } else { format!(".{rest}") };
        let exp_sign = if exp < 0 { '-' } else { '+' };
        return format!("{sign}{lead}{fraction}e{exp_sign}{:02}", exp.abs());
    }

    let point = exp + 1;
    if point <= 0 {
        format!("{sign}0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if point as usize >= digits.len() {
        format!("{sign}{digits}{}.0", "0".repeat(point as usize - digits.len()))
    } else {
        let (int, frac) = digits.split_at(point as usize);
        format!("{sign}{int}.{frac}")
    }
}

/// Serializes `value` to canonical JSON text.
pub fn to_canonical_string<T>(value: &T) -> Result<String, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    let tree = serde_json::to_value(value)?;
    let mut out = Vec::with_capacity(256);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
    tree.serialize(&mut ser)?;
    String::from_utf8(out).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

/// SHA-256 of `data` as lowercase hex.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}
