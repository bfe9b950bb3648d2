//! Binary wire codec for chunk listings.
//!
//! A listing is a flat stream of length-delimited `Chunk` records written
//! back-to-back with no header; an empty stream is an empty listing. Fields
//! are tagged with `(field_number << 3) | wire_type` keys and varint-coded
//! lengths, so readers can skip fields they do not recognize. Tags are
//! stable and additive-only:
//!
//! - top level, field 1 (length-delimited): one `Chunk` record
//! - `Chunk` field 1 (length-delimited): hash, exactly [`HASH_LENGTH_BYTES`]
//! - `Chunk` field 2 (varint): chunk length in bytes, always ≥ 1
//!
//! Offsets are never encoded; they are derived from lengths on decode.

use bytes::{Buf, BufMut, BytesMut};
use keel_types::{ChunkHash, HASH_LENGTH_BYTES};

use crate::error::ListingError;
use crate::listing::ChunkEntry;

const FIELD_CHUNK: u64 = 1;
const FIELD_HASH: u64 = 1;
const FIELD_LENGTH: u64 = 2;

const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LEN: u64 = 2;
const WIRE_FIXED32: u64 = 5;

/// Encode entries as repeated `Chunk` records in the given order.
pub(crate) fn encode(entries: &[ChunkEntry]) -> Vec<u8> {
    // Per record: two keys, two length varints, the digest, the length.
    let mut buf = BytesMut::with_capacity(entries.len() * (HASH_LENGTH_BYTES + 10));
    let mut record = BytesMut::with_capacity(HASH_LENGTH_BYTES + 8);

    for entry in entries {
        record.clear();
        put_key(&mut record, FIELD_HASH, WIRE_LEN);
        put_varint(&mut record, HASH_LENGTH_BYTES as u64);
        record.put_slice(entry.hash.as_bytes());
        put_key(&mut record, FIELD_LENGTH, WIRE_VARINT);
        put_varint(&mut record, u64::from(entry.length));

        put_key(&mut buf, FIELD_CHUNK, WIRE_LEN);
        put_varint(&mut buf, record.len() as u64);
        buf.put_slice(&record);
    }

    buf.to_vec()
}

/// Decode a record stream into ordered `(hash, length)` pairs.
///
/// Unknown fields are skipped by wire type; a record missing its hash or
/// length, or carrying a malformed one, fails the whole parse.
pub(crate) fn decode(mut buf: &[u8]) -> Result<Vec<(ChunkHash, u32)>, ListingError> {
    let mut pairs = Vec::new();

    while buf.has_remaining() {
        let (field, wire_type) = get_key(&mut buf)?;
        if field == FIELD_CHUNK && wire_type == WIRE_LEN {
            let record = get_len_delimited(&mut buf, "chunk record")?;
            pairs.push(decode_record(record)?);
        } else {
            skip_field(&mut buf, wire_type)?;
        }
    }

    Ok(pairs)
}

fn decode_record(mut buf: &[u8]) -> Result<(ChunkHash, u32), ListingError> {
    let mut hash = None;
    let mut length = None;

    while buf.has_remaining() {
        let (field, wire_type) = get_key(&mut buf)?;
        match (field, wire_type) {
            (FIELD_HASH, WIRE_LEN) => {
                let bytes = get_len_delimited(&mut buf, "hash field")?;
                let digest = ChunkHash::try_from(bytes)
                    .map_err(|e| ListingError::MalformedListing(e.to_string()))?;
                hash = Some(digest);
            }
            (FIELD_LENGTH, WIRE_VARINT) => {
                let value = get_varint(&mut buf)?;
                let value = u32::try_from(value).map_err(|_| {
                    ListingError::MalformedListing(format!("chunk length {value} out of range"))
                })?;
                if value == 0 {
                    return Err(ListingError::MalformedListing(
                        "chunk length must be positive".to_owned(),
                    ));
                }
                length = Some(value);
            }
            // Unknown field in a record: skip for forward compatibility.
            _ => skip_field(&mut buf, wire_type)?,
        }
    }

    match (hash, length) {
        (Some(hash), Some(length)) => Ok((hash, length)),
        (None, _) => Err(ListingError::MalformedListing(
            "chunk record missing hash".to_owned(),
        )),
        (_, None) => Err(ListingError::MalformedListing(
            "chunk record missing length".to_owned(),
        )),
    }
}

fn put_key(buf: &mut BytesMut, field: u64, wire_type: u64) {
    put_varint(buf, (field << 3) | wire_type);
}

fn put_varint(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

fn get_key(buf: &mut &[u8]) -> Result<(u64, u64), ListingError> {
    let key = get_varint(buf)?;
    Ok((key >> 3, key & 0x7))
}

fn get_varint(buf: &mut &[u8]) -> Result<u64, ListingError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        if !buf.has_remaining() {
            return Err(ListingError::MalformedListing(
                "truncated varint".to_owned(),
            ));
        }
        if shift >= 64 {
            return Err(ListingError::MalformedListing(
                "varint overflows 64 bits".to_owned(),
            ));
        }
        let byte = buf.get_u8();
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

fn get_len_delimited<'a>(
    buf: &mut &'a [u8],
    context: &str,
) -> Result<&'a [u8], ListingError> {
    let len = get_varint(buf)? as usize;
    if buf.remaining() < len {
        return Err(ListingError::MalformedListing(format!(
            "truncated {context}: need {len} bytes, have {}",
            buf.remaining()
        )));
    }
    let (taken, rest) = buf.split_at(len);
    *buf = rest;
    Ok(taken)
}

fn skip_field(buf: &mut &[u8], wire_type: u64) -> Result<(), ListingError> {
    match wire_type {
        WIRE_VARINT => {
            get_varint(buf)?;
        }
        WIRE_FIXED64 => {
            if buf.remaining() < 8 {
                return Err(ListingError::MalformedListing(
                    "truncated 64-bit field".to_owned(),
                ));
            }
            buf.advance(8);
        }
        WIRE_LEN => {
            get_len_delimited(buf, "length-delimited field")?;
        }
        WIRE_FIXED32 => {
            if buf.remaining() < 4 {
                return Err(ListingError::MalformedListing(
                    "truncated 32-bit field".to_owned(),
                ));
            }
            buf.advance(4);
        }
        other => {
            return Err(ListingError::MalformedListing(format!(
                "unknown wire type {other}"
            )));
        }
    }
    Ok(())
}
