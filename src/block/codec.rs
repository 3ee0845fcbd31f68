// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Columnar block byte layout and the scalar slot codec.
//!
//! A block is a run of positions, each either null or a byte slice.
//! Serialized form:
//!
//! ```text
//! u32 position count
//! u32 end offset per position (into the payload)
//! u8  null flag per position
//! payload bytes
//! ```
//!
//! Nested containers are whole blocks serialized into a parent slot.

use crate::common::error::AdapterError;
use crate::data::{Canonical, DataType};

/// An immutable run of value slots. Positions are never mutated in place;
/// updates go through [`BlockBuilder`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    buf: Vec<u8>,
    offsets: Vec<u32>,
    nulls: Vec<bool>,
}

impl Block {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn position_count(&self) -> usize {
        self.offsets.len()
    }

    /// The bytes at `position`, or `None` for a null slot.
    pub fn slot(&self, position: usize) -> Result<Option<&[u8]>, AdapterError> {
        if position >= self.offsets.len() {
            return Err(AdapterError::MalformedBlock(format!(
                "position {position} out of range for {} positions",
                self.offsets.len()
            )));
        }
        if self.nulls[position] {
            return Ok(None);
        }
        let start = if position == 0 {
            0
        } else {
            self.offsets[position - 1] as usize
        };
        let end = self.offsets[position] as usize;
        Ok(Some(&self.buf[start..end]))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(4 + self.offsets.len() * 5 + self.buf.len());
        out.extend_from_slice(&(self.offsets.len() as u32).to_le_bytes());
        for offset in &self.offsets {
            out.extend_from_slice(&offset.to_le_bytes());
        }
        for null in &self.nulls {
            out.push(u8::from(*null));
        }
        out.extend_from_slice(&self.buf);
        out
    }

    /// Deserialize a block, validating every structural invariant. Engine
    /// buffers cross a trust boundary here, so nothing is assumed.
    pub fn from_bytes(data: &[u8]) -> Result<Self, AdapterError> {
        let count = read_le_u32(data, 0)? as usize;
        let header_end = 4 + count * 5;
        if data.len() < header_end {
            return Err(AdapterError::MalformedBlock(format!(
                "block header truncated: {} bytes for {count} positions",
                data.len()
            )));
        }
        let mut offsets = Vec::with_capacity(count);
        let mut prev = 0u32;
        for i in 0..count {
            let offset = read_le_u32(data, 4 + i * 4)?;
            if offset < prev {
                return Err(AdapterError::MalformedBlock(format!(
                    "offsets not monotonic at position {i}: {offset} < {prev}"
                )));
            }
            prev = offset;
            offsets.push(offset);
        }
        let mut nulls = Vec::with_capacity(count);
        for i in 0..count {
            match data[4 + count * 4 + i] {
                0 => nulls.push(false),
                1 => nulls.push(true),
                other => {
                    return Err(AdapterError::MalformedBlock(format!(
                        "invalid null flag {other} at position {i}"
                    )));
                }
            }
        }
        let buf = data[header_end..].to_vec();
        if prev as usize != buf.len() {
            return Err(AdapterError::MalformedBlock(format!(
                "payload length {} does not match final offset {prev}",
                buf.len()
            )));
        }
        Ok(Self { buf, offsets, nulls })
    }
}

/// Appends slots one position at a time and seals them into a [`Block`].
#[derive(Debug, Default)]
pub struct BlockBuilder {
    buf: Vec<u8>,
    offsets: Vec<u32>,
    nulls: Vec<bool>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_slot(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.offsets.push(self.buf.len() as u32);
        self.nulls.push(false);
    }

    pub fn append_null(&mut self) {
        self.offsets.push(self.buf.len() as u32);
        self.nulls.push(true);
    }

    /// Replay one position of `source` verbatim, byte for byte.
    pub fn append_from(&mut self, source: &Block, position: usize) -> Result<(), AdapterError> {
        match source.slot(position)? {
            Some(bytes) => self.append_slot(bytes),
            None => self.append_null(),
        }
        Ok(())
    }

    pub fn build(self) -> Block {
        Block {
            buf: self.buf,
            offsets: self.offsets,
            nulls: self.nulls,
        }
    }
}

/// Encode a non-null standard-form value into the slot encoding for
/// `data_type`. Null slots never reach here; the builder records them in
/// the null flags instead.
pub fn encode(
    data_type: &DataType,
    value: &Canonical,
    out: &mut Vec<u8>,
) -> Result<(), AdapterError> {
    match (data_type, value) {
        (DataType::Integer, Canonical::Integer(v)) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        (DataType::Long, Canonical::Long(v)) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        (DataType::Boolean, Canonical::Boolean(v)) => {
            out.push(u8::from(*v));
            Ok(())
        }
        (DataType::String, Canonical::String(s)) => {
            out.extend_from_slice(s.as_bytes());
            Ok(())
        }
        (DataType::Array(element), Canonical::Array(items)) => {
            let mut builder = BlockBuilder::new();
            for item in items {
                append_canonical(&mut builder, element, item)?;
            }
            out.extend_from_slice(&builder.build().to_bytes());
            Ok(())
        }
        (DataType::Map(key, value_type), Canonical::Map(entries)) => {
            let mut builder = BlockBuilder::new();
            for (k, v) in entries {
                append_canonical(&mut builder, key, k)?;
                append_canonical(&mut builder, value_type, v)?;
            }
            out.extend_from_slice(&builder.build().to_bytes());
            Ok(())
        }
        (DataType::Struct(fields), Canonical::Struct(values)) => {
            if fields.len() != values.len() {
                return Err(AdapterError::KeyConversion(format!(
                    "struct arity mismatch: {} fields, {} values",
                    fields.len(),
                    values.len()
                )));
            }
            let mut builder = BlockBuilder::new();
            for (field, value) in fields.iter().zip(values) {
                append_canonical(&mut builder, &field.data_type, value)?;
            }
            out.extend_from_slice(&builder.build().to_bytes());
            Ok(())
        }
        (data_type, value) => Err(AdapterError::KeyConversion(format!(
            "cannot encode {value:?} as {data_type}"
        ))),
    }
}

/// Append one standard-form value as a slot, null-aware.
pub fn append_canonical(
    builder: &mut BlockBuilder,
    data_type: &DataType,
    value: &Canonical,
) -> Result<(), AdapterError> {
    if matches!(value, Canonical::Null) {
        builder.append_null();
        return Ok(());
    }
    let mut bytes = Vec::new();
    encode(data_type, value, &mut bytes)?;
    builder.append_slot(&bytes);
    Ok(())
}

/// Decode one slot back into standard form. Integers written by engines
/// that pack 64-bit values into 4 bytes when they fit are accepted for
/// `Long`, so equal values may not be byte-identical.
pub fn decode(data_type: &DataType, bytes: &[u8]) -> Result<Canonical, AdapterError> {
    match data_type {
        DataType::Integer => Ok(Canonical::Integer(read_le_i32(bytes)?)),
        DataType::Long => match bytes.len() {
            4 => Ok(Canonical::Long(read_le_i32(bytes)? as i64)),
            8 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                Ok(Canonical::Long(i64::from_le_bytes(raw)))
            }
            n => Err(AdapterError::MalformedBlock(format!(
                "long slot of {n} bytes"
            ))),
        },
        DataType::Boolean => match bytes {
            [0] => Ok(Canonical::Boolean(false)),
            [1] => Ok(Canonical::Boolean(true)),
            _ => Err(AdapterError::MalformedBlock(format!(
                "boolean slot of {} bytes",
                bytes.len()
            ))),
        },
        DataType::String => match std::str::from_utf8(bytes) {
            Ok(s) => Ok(Canonical::String(s.to_string())),
            Err(e) => Err(AdapterError::MalformedBlock(format!(
                "string slot is not utf-8: {e}"
            ))),
        },
        DataType::Array(element) => {
            let block = Block::from_bytes(bytes)?;
            let mut items = Vec::with_capacity(block.position_count());
            for pos in 0..block.position_count() {
                items.push(decode_slot(element, &block, pos)?);
            }
            Ok(Canonical::Array(items))
        }
        DataType::Map(key, value) => {
            let block = Block::from_bytes(bytes)?;
            if block.position_count() % 2 != 0 {
                return Err(AdapterError::MalformedBlock(format!(
                    "map block with odd position count {}",
                    block.position_count()
                )));
            }
            let mut entries = Vec::with_capacity(block.position_count() / 2);
            for i in 0..block.position_count() / 2 {
                entries.push((
                    decode_slot(key, &block, 2 * i)?,
                    decode_slot(value, &block, 2 * i + 1)?,
                ));
            }
            Ok(Canonical::Map(entries))
        }
        DataType::Struct(fields) => {
            let block = Block::from_bytes(bytes)?;
            if block.position_count() != fields.len() {
                return Err(AdapterError::MalformedBlock(format!(
                    "struct block with {} positions for {} fields",
                    block.position_count(),
                    fields.len()
                )));
            }
            let mut values = Vec::with_capacity(fields.len());
            for (pos, field) in fields.iter().enumerate() {
                values.push(decode_slot(&field.data_type, &block, pos)?);
            }
            Ok(Canonical::Struct(values))
        }
    }
}

/// Decode one position of `block`, null-aware.
pub fn decode_slot(
    data_type: &DataType,
    block: &Block,
    position: usize,
) -> Result<Canonical, AdapterError> {
    match block.slot(position)? {
        Some(bytes) => decode(data_type, bytes),
        None => Ok(Canonical::Null),
    }
}

fn read_le_u32(data: &[u8], offset: usize) -> Result<u32, AdapterError> {
    let end = offset
        .checked_add(4)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| {
            AdapterError::MalformedBlock(format!(
                "u32 read at {offset} past end of {} bytes",
                data.len()
            ))
        })?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&data[offset..end]);
    Ok(u32::from_le_bytes(raw))
}

fn read_le_i32(bytes: &[u8]) -> Result<i32, AdapterError> {
    if bytes.len() != 4 {
        return Err(AdapterError::MalformedBlock(format!(
            "integer slot of {} bytes",
            bytes.len()
        )));
    }
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    Ok(i32::from_le_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StructField;

    #[test]
    fn builder_preserves_slots_and_nulls() {
        let mut builder = BlockBuilder::new();
        builder.append_slot(b"ab");
        builder.append_null();
        builder.append_slot(b"");
        let block = builder.build();
        assert_eq!(block.position_count(), 3);
        assert_eq!(block.slot(0).unwrap(), Some(&b"ab"[..]));
        assert_eq!(block.slot(1).unwrap(), None);
        assert_eq!(block.slot(2).unwrap(), Some(&b""[..]));
        assert!(block.slot(3).is_err());
    }

    #[test]
    fn serialized_block_survives_deserialization() {
        let mut builder = BlockBuilder::new();
        builder.append_slot(&7i32.to_le_bytes());
        builder.append_null();
        let block = builder.build();
        let restored = Block::from_bytes(&block.to_bytes()).expect("deserialize");
        assert_eq!(restored, block);
    }

    #[test]
    fn from_bytes_rejects_truncated_and_inconsistent_buffers() {
        let mut builder = BlockBuilder::new();
        builder.append_slot(b"abcd");
        let bytes = block_bytes(builder);
        // Header says one position but the offsets are cut off.
        assert!(Block::from_bytes(&bytes[..4]).is_err());
        // Payload shorter than the final offset claims.
        assert!(Block::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }

    fn block_bytes(builder: BlockBuilder) -> Vec<u8> {
        builder.build().to_bytes()
    }

    #[test]
    fn long_decoder_accepts_compact_four_byte_form() {
        let wide = decode(&DataType::Long, &42i64.to_le_bytes()).unwrap();
        let compact = decode(&DataType::Long, &42i32.to_le_bytes()).unwrap();
        assert_eq!(wide, compact);
        assert!(decode(&DataType::Long, &[0, 1, 2]).is_err());
    }

    #[test]
    fn nested_struct_round_trips_through_slot_encoding() {
        let ty = DataType::Struct(vec![
            StructField::new("id", DataType::Integer),
            StructField::new("tags", DataType::array(DataType::String)),
        ]);
        let value = Canonical::Struct(vec![
            Canonical::Integer(3),
            Canonical::Array(vec![Canonical::String("x".into()), Canonical::Null]),
        ]);
        let mut bytes = Vec::new();
        encode(&ty, &value, &mut bytes).expect("encode");
        assert_eq!(decode(&ty, &bytes).expect("decode"), value);
    }

    #[test]
    fn encode_rejects_type_mismatch() {
        let mut bytes = Vec::new();
        let err = encode(&DataType::Integer, &Canonical::String("x".into()), &mut bytes)
            .expect_err("mismatch");
        assert!(matches!(err, AdapterError::KeyConversion(_)), "err={err}");
    }
}
