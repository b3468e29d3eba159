//! Compact, read-only byte encoding for [`crate::FeatureVector`] (spec §6).
//!
//! Format, bit-exact: for each `(key, value)` pair sorted by key ascending,
//! the key is stored as an unsigned LEB128 **delta** from the previous key
//! (the first key is a delta from zero); the value is stored as one header
//! byte `(type << 4) | size` followed by `size` little-endian value bytes,
//! where `type` is `0` (signed int), `1` (unsigned int) or `2` (float) and
//! `size` is `1..=8` for ints or `4`/`8` for floats (`float32`/`float64`).
//! The encoder always picks the smallest representation that round-trips
//! exactly, mirroring the original `feature_vector_compact.hpp`'s
//! "do not allow any modification, use input-iterator" contract: this type
//! supports only forward iteration over its decoded pairs.

use crate::feature::{FeatureId, FeatureVector};

const TYPE_SIGNED: u8 = 0;
const TYPE_UNSIGNED: u8 = 1;
const TYPE_FLOAT: u8 = 2;

/// A read-only, byte-exact compact encoding of a [`FeatureVector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactFeatureVector {
    bytes: Vec<u8>,
}

fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

fn read_varint(bytes: &[u8], pos: &mut usize) -> Option<u64> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = *bytes.get(*pos)?;
        *pos += 1;
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    Some(result)
}

fn minimal_int_bytes(value: i64) -> (u8, u8, Vec<u8>) {
    if value >= 0 {
        let v = value as u64;
        let size = minimal_unsigned_size(v);
        (TYPE_UNSIGNED, size, v.to_le_bytes()[..size as usize].to_vec())
    } else {
        let bytes = value.to_le_bytes();
        let mut size = 8u8;
        for candidate in 1..=8u8 {
            let truncated = sign_extend(&bytes[..candidate as usize]);
            if truncated == value {
                size = candidate;
                break;
            }
        }
        (TYPE_SIGNED, size, value.to_le_bytes()[..size as usize].to_vec())
    }
}

fn minimal_unsigned_size(v: u64) -> u8 {
    for size in 1..=8u8 {
        if size == 8 || v < (1u64 << (size * 8)) {
            return size;
        }
    }
    8
}

fn sign_extend(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    let sign_bit = bytes[bytes.len() - 1] & 0x80 != 0;
    if sign_bit {
        for b in buf.iter_mut().skip(bytes.len()) {
            *b = 0xff;
        }
    }
    i64::from_le_bytes(buf)
}

fn encode_value(buf: &mut Vec<u8>, value: f64) {
    if value.fract() == 0.0 && value.is_finite() && value.abs() <= i64::MAX as f64 {
        let (ty, size, bytes) = minimal_int_bytes(value as i64);
        buf.push((ty << 4) | size);
        buf.extend_from_slice(&bytes);
        return;
    }
    let as_f32 = value as f32;
    if as_f32 as f64 == value {
        buf.push((TYPE_FLOAT << 4) | 4);
        buf.extend_from_slice(&as_f32.to_le_bytes());
    } else {
        buf.push((TYPE_FLOAT << 4) | 8);
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

fn decode_value(bytes: &[u8], pos: &mut usize) -> Option<f64> {
    let header = *bytes.get(*pos)?;
    *pos += 1;
    let ty = header >> 4;
    let size = (header & 0x0f) as usize;
    let chunk = bytes.get(*pos..*pos + size)?;
    *pos += size;
    Some(match ty {
        TYPE_SIGNED => sign_extend(chunk) as f64,
        TYPE_UNSIGNED => {
            let mut buf = [0u8; 8];
            buf[..size].copy_from_slice(chunk);
            u64::from_le_bytes(buf) as f64
        }
        TYPE_FLOAT if size == 4 => f32::from_le_bytes(chunk.try_into().ok()?) as f64,
        TYPE_FLOAT => f64::from_le_bytes(chunk.try_into().ok()?),
        _ => return None,
    })
}

impl CompactFeatureVector {
    /// Encodes `fv` into its compact byte representation.
    pub fn encode(fv: &FeatureVector) -> Self {
        let mut bytes = Vec::new();
        let mut prev = 0u32;
        for (key, value) in fv.iter() {
            let raw = key_raw(key);
            write_varint(&mut bytes, (raw - prev) as u64);
            prev = raw;
            encode_value(&mut bytes, value);
        }
        CompactFeatureVector { bytes }
    }

    /// Decodes this compact vector back into a [`FeatureVector`], yielding
    /// the same `(key, value)` multiset as the original (round-trip law,
    /// spec §8).
    pub fn decode(&self) -> FeatureVector {
        self.iter().collect()
    }

    /// Returns the raw encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Forward-only iterator over the decoded `(key, value)` pairs.
    pub fn iter(&self) -> CompactIter<'_> {
        CompactIter {
            bytes: &self.bytes,
            pos: 0,
            prev_key: 0,
        }
    }
}

fn key_raw(key: FeatureId) -> u32 {
    crate::feature::feature_id_raw(key)
}

/// Forward iterator decoding `(key, value)` pairs from a [`CompactFeatureVector`].
pub struct CompactIter<'a> {
    bytes: &'a [u8],
    pos: usize,
    prev_key: u32,
}

impl Iterator for CompactIter<'_> {
    type Item = (FeatureId, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let delta = read_varint(self.bytes, &mut self.pos)? as u32;
        self.prev_key += delta;
        let value = decode_value(self.bytes, &mut self.pos)?;
        Some((crate::feature::feature_id_from_raw(self.prev_key), value))
    }
}
