//! Validators for wire-safe primitives.
//!
//! Each validator takes an untyped [`Value`] and the [`InvalidDataReason`] to
//! fail with. Nothing is coerced: a value is either accepted as-is in its
//! canonical form or rejected with exactly that reason. The newtypes here mark
//! values that have already passed validation.

use std::ops::RangeInclusive;

use serde_json::{Map, Value};

use crate::error::InvalidDataReason;
use crate::types::{DerivationPath, MAX_PATH_LENGTH};

/// Total ADA supply in lovelace; no amount on chain can exceed it.
pub const MAX_LOVELACE_SUPPLY: u64 = 45_000_000_000_000_000;

/// A range-checked unsigned 64-bit amount. Always serialized as 8 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint64Str(u64);

impl Uint64Str {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Uint64Str {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A range-checked signed 64-bit amount (mint quantities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Int64Str(i64);

impl Int64Str {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Int64Str {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bytes decoded from a hex string of exactly `2 * N` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedHex<const N: usize>([u8; N]);

impl<const N: usize> FixedHex<N> {
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> AsRef<[u8]> for FixedHex<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 28-byte Blake2b-224 hash: key hashes, script hashes, policy ids.
pub type Hash28 = FixedHex<28>;
/// 32-byte Blake2b-256 hash: tx hashes, VRF key hashes, metadata hashes.
pub type Hash32 = FixedHex<32>;

/// Bytes decoded from a hex string of bounded length.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarHex(Vec<u8>);

impl VarHex {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A string made only of printable ASCII (32..=126).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AsciiString(String);

impl AsciiString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

pub fn parse_object<'a>(
    value: &'a Value,
    reason: InvalidDataReason,
) -> Result<&'a Map<String, Value>, InvalidDataReason> {
    value.as_object().ok_or(reason)
}

pub fn parse_array<'a>(
    value: &'a Value,
    reason: InvalidDataReason,
) -> Result<&'a Vec<Value>, InvalidDataReason> {
    value.as_array().ok_or(reason)
}

/// Looks up an optional field. Missing and `null` are both "absent".
pub fn optional<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Looks up a field, treating absence as `reason`.
pub fn required<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    reason: InvalidDataReason,
) -> Result<&'a Value, InvalidDataReason> {
    optional(obj, key).ok_or(reason)
}

/// Optional array field; absent means empty.
pub fn optional_array<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    reason: InvalidDataReason,
) -> Result<&'a [Value], InvalidDataReason> {
    match optional(obj, key) {
        None => Ok(&[]),
        Some(v) => Ok(parse_array(v, reason)?.as_slice()),
    }
}

pub fn parse_hex_fixed<const N: usize>(
    value: &Value,
    reason: InvalidDataReason,
) -> Result<FixedHex<N>, InvalidDataReason> {
    let bytes = decode_hex(value, reason)?;
    let arr: [u8; N] = bytes.try_into().map_err(|_| reason)?;
    Ok(FixedHex(arr))
}

pub fn parse_hex_var(
    value: &Value,
    max_len: usize,
    reason: InvalidDataReason,
) -> Result<VarHex, InvalidDataReason> {
    let bytes = decode_hex(value, reason)?;
    if bytes.len() > max_len {
        return Err(reason);
    }
    Ok(VarHex(bytes))
}

fn decode_hex(value: &Value, reason: InvalidDataReason) -> Result<Vec<u8>, InvalidDataReason> {
    let s = value.as_str().ok_or(reason)?;
    if s.len() % 2 != 0 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(reason);
    }
    hex::decode(s).map_err(|_| reason)
}

pub fn parse_uint64(
    value: &Value,
    range: RangeInclusive<u64>,
    reason: InvalidDataReason,
) -> Result<Uint64Str, InvalidDataReason> {
    parse_bounded(value, range, reason).map(Uint64Str)
}

pub fn parse_int64(
    value: &Value,
    range: RangeInclusive<i64>,
    reason: InvalidDataReason,
) -> Result<Int64Str, InvalidDataReason> {
    parse_bounded(value, range, reason).map(Int64Str)
}

pub fn parse_uint32(value: &Value, reason: InvalidDataReason) -> Result<u32, InvalidDataReason> {
    parse_bounded(value, 0..=u32::MAX, reason)
}

pub fn parse_uint16(value: &Value, reason: InvalidDataReason) -> Result<u16, InvalidDataReason> {
    parse_bounded(value, 0..=u16::MAX, reason)
}

pub fn parse_uint8(
    value: &Value,
    range: RangeInclusive<u8>,
    reason: InvalidDataReason,
) -> Result<u8, InvalidDataReason> {
    parse_bounded(value, range, reason)
}

/// Accepts a JSON integer or a canonical decimal string and checks it
/// against `range`.
pub fn parse_bounded<T>(
    value: &Value,
    range: RangeInclusive<T>,
    reason: InvalidDataReason,
) -> Result<T, InvalidDataReason>
where
    T: Copy + Into<i128> + TryFrom<i128>,
{
    let n = parse_integer(value).ok_or(reason)?;
    let (min, max): (i128, i128) = ((*range.start()).into(), (*range.end()).into());
    if n < min || n > max {
        return Err(reason);
    }
    T::try_from(n).map_err(|_| reason)
}

fn parse_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(i128::from)
            .or_else(|| n.as_i64().map(i128::from)),
        Value::String(s) => parse_canonical_decimal(s),
        _ => None,
    }
}

/// `0`, or an optional `-` followed by digits without a leading zero.
fn parse_canonical_decimal(s: &str) -> Option<i128> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || digits.len() > 20 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.starts_with('0') && (digits.len() > 1 || s.starts_with('-')) {
        return None;
    }
    s.parse().ok()
}

/// Accepts an array of `u32` components or `m/...` notation.
pub fn parse_path(value: &Value, reason: InvalidDataReason) -> Result<DerivationPath, InvalidDataReason> {
    match value {
        Value::String(s) => s.parse().map_err(|_| reason),
        Value::Array(items) => {
            if items.len() > MAX_PATH_LENGTH {
                return Err(reason);
            }
            let components = items
                .iter()
                .map(|c| parse_uint32(c, reason))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DerivationPath::from_validated(components))
        }
        _ => Err(reason),
    }
}

pub fn parse_ascii(
    value: &Value,
    max_len: usize,
    reason: InvalidDataReason,
) -> Result<AsciiString, InvalidDataReason> {
    let s = value.as_str().ok_or(reason)?;
    if s.len() > max_len || !s.bytes().all(|b| (32..=126).contains(&b)) {
        return Err(reason);
    }
    Ok(AsciiString(s.to_owned()))
}
