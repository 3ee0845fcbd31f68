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

//! Columnar block backend: containers are immutable byte runs, lookups are
//! linear scans with an engine-resolved key-equality operator, and every
//! mutation rebuilds the whole block.

pub mod codec;

use std::fmt;
use std::sync::Arc;

pub use codec::{Block, BlockBuilder};

use crate::common::error::AdapterError;
use crate::data::{
    ArrayDatum, BooleanDatum, Canonical, DataType, Datum, DatumFactory, Element, IntegerDatum,
    LongDatum, MapDatum, StringDatum, StructDatum, StructField,
};

/// Engine-side type tag attached to a block slot at the dispatch boundary.
/// The trailing variants are engine types the portable layer does not
/// support.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineType {
    Int32,
    Int64,
    Bool,
    Utf8,
    Array(Box<EngineType>),
    Map(Box<EngineType>, Box<EngineType>),
    Row(Vec<(String, EngineType)>),
    Void,
    Float64,
    Binary,
    Decimal { precision: u8, scale: u8 },
    Timestamp,
}

/// Portable shape for an engine type: `None` for `Void`, error for types
/// the portable layer does not support.
pub fn data_type(engine: &EngineType) -> Result<Option<DataType>, AdapterError> {
    match engine {
        EngineType::Int32 => Ok(Some(DataType::Integer)),
        EngineType::Int64 => Ok(Some(DataType::Long)),
        EngineType::Bool => Ok(Some(DataType::Boolean)),
        EngineType::Utf8 => Ok(Some(DataType::String)),
        EngineType::Array(element) => {
            let element = data_type(element)?
                .ok_or_else(|| AdapterError::UnsupportedShape("void array element".to_string()))?;
            Ok(Some(DataType::array(element)))
        }
        EngineType::Map(key, value) => {
            let key = data_type(key)?
                .ok_or_else(|| AdapterError::UnsupportedShape("void map key".to_string()))?;
            let value = data_type(value)?
                .ok_or_else(|| AdapterError::UnsupportedShape("void map value".to_string()))?;
            Ok(Some(DataType::map(key, value)))
        }
        EngineType::Row(fields) => {
            let mut out = Vec::with_capacity(fields.len());
            for (name, engine) in fields {
                let field = data_type(engine)?.ok_or_else(|| {
                    AdapterError::UnsupportedShape(format!("void row field {name}"))
                })?;
                out.push(StructField::new(name.clone(), field));
            }
            Ok(Some(DataType::Struct(out)))
        }
        EngineType::Void => Ok(None),
        other => Err(AdapterError::UnsupportedShape(format!(
            "engine type {other:?}"
        ))),
    }
}

/// Key-equality operator over raw slots, resolved once per container. Both
/// sides may be null; a null key slot only matches a null probe.
pub type KeyEquality =
    Arc<dyn Fn(Option<&[u8]>, Option<&[u8]>) -> Result<bool, AdapterError> + Send + Sync>;

/// Source of engine operators. Containers resolve the equality operator for
/// their key type at construction, so a missing operator fails fast rather
/// than on the first lookup.
pub trait OperatorRegistry: fmt::Debug + Send + Sync {
    fn key_equality(&self, key_type: &DataType) -> Result<KeyEquality, AdapterError>;
}

/// Default registry: decodes both slots and compares in standard form.
/// Map-typed keys have no well-defined slot equality (entry order is not
/// canonical), so resolution fails for them.
#[derive(Debug, Default)]
pub struct NativeOperators;

impl OperatorRegistry for NativeOperators {
    fn key_equality(&self, key_type: &DataType) -> Result<KeyEquality, AdapterError> {
        if matches!(key_type, DataType::Map(_, _)) {
            return Err(AdapterError::OperatorResolution {
                key_type: key_type.to_string(),
                message: "no equality operator for map-typed keys".to_string(),
            });
        }
        let key_type = key_type.clone();
        Ok(Arc::new(move |a, b| match (a, b) {
            (None, None) => Ok(true),
            (None, Some(_)) | (Some(_), None) => Ok(false),
            (Some(a), Some(b)) => {
                Ok(codec::decode(&key_type, a)? == codec::decode(&key_type, b)?)
            }
        }))
    }
}

/// A map over one block: keys at even positions, values at odd positions.
#[derive(Clone)]
pub struct BlockMap {
    block: Block,
    key_type: DataType,
    value_type: DataType,
    key_equal: KeyEquality,
    ops: Arc<dyn OperatorRegistry>,
}

impl fmt::Debug for BlockMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockMap")
            .field("key_type", &self.key_type)
            .field("value_type", &self.value_type)
            .field("positions", &self.block.position_count())
            .finish()
    }
}

impl BlockMap {
    pub fn new(
        block: Block,
        key_type: DataType,
        value_type: DataType,
        ops: Arc<dyn OperatorRegistry>,
    ) -> Result<Self, AdapterError> {
        if block.position_count() % 2 != 0 {
            return Err(AdapterError::MalformedBlock(format!(
                "map block with odd position count {}",
                block.position_count()
            )));
        }
        let key_equal = ops.key_equality(&key_type)?;
        Ok(Self {
            block,
            key_type,
            value_type,
            key_equal,
            ops,
        })
    }

    pub fn data_type(&self) -> DataType {
        DataType::map(self.key_type.clone(), self.value_type.clone())
    }

    pub fn size(&self) -> usize {
        self.block.position_count() / 2
    }

    /// The map's backing block, for verbatim egress.
    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn get(&self, key: &Datum) -> Result<Option<Datum>, AdapterError> {
        let probe = self.probe_bytes(key)?;
        match self.seek_key(probe.as_deref())? {
            Some(value_pos) => wrap_slot(&self.block, value_pos, &self.value_type, &self.ops),
            None => Ok(None),
        }
    }

    pub fn contains_key(&self, key: &Datum) -> Result<bool, AdapterError> {
        let probe = self.probe_bytes(key)?;
        Ok(self.seek_key(probe.as_deref())?.is_some())
    }

    /// Rebuild the block with `key` bound to `value`. Untouched entries are
    /// replayed byte for byte; only the affected slot is re-encoded.
    pub fn put(&mut self, key: &Datum, value: &Datum) -> Result<(), AdapterError> {
        let probe = self.probe_bytes(key)?;
        let value_form = value.to_canonical()?;
        let mut builder = BlockBuilder::new();
        let mut replaced = false;
        for i in 0..self.size() {
            let key_pos = 2 * i;
            builder.append_from(&self.block, key_pos)?;
            let matches = !replaced
                && (self.key_equal)(self.block.slot(key_pos)?, probe.as_deref())?;
            if matches {
                codec::append_canonical(&mut builder, &self.value_type, &value_form)?;
                replaced = true;
            } else {
                builder.append_from(&self.block, key_pos + 1)?;
            }
        }
        if !replaced {
            match &probe {
                Some(bytes) => builder.append_slot(bytes),
                None => builder.append_null(),
            }
            codec::append_canonical(&mut builder, &self.value_type, &value_form)?;
        }
        self.block = builder.build();
        Ok(())
    }

    pub fn keys(&self) -> impl Iterator<Item = Element> + '_ {
        (0..self.size()).map(move |i| wrap_slot(&self.block, 2 * i, &self.key_type, &self.ops))
    }

    pub fn values(&self) -> impl Iterator<Item = Element> + '_ {
        (0..self.size())
            .map(move |i| wrap_slot(&self.block, 2 * i + 1, &self.value_type, &self.ops))
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        let mut entries = Vec::with_capacity(self.size());
        for i in 0..self.size() {
            entries.push((
                codec::decode_slot(&self.key_type, &self.block, 2 * i)?,
                codec::decode_slot(&self.value_type, &self.block, 2 * i + 1)?,
            ));
        }
        Ok(Canonical::Map(entries))
    }

    /// Encode a probe key into this map's key slot encoding. A null probe
    /// stays `None` and only matches a null key slot.
    fn probe_bytes(&self, key: &Datum) -> Result<Option<Vec<u8>>, AdapterError> {
        match key.to_canonical()? {
            Canonical::Null => Ok(None),
            form => {
                let mut bytes = Vec::new();
                codec::encode(&self.key_type, &form, &mut bytes)?;
                Ok(Some(bytes))
            }
        }
    }

    /// Position of the value slot for `probe`, scanning key slots in order.
    fn seek_key(&self, probe: Option<&[u8]>) -> Result<Option<usize>, AdapterError> {
        for i in 0..self.size() {
            if (self.key_equal)(self.block.slot(2 * i)?, probe)? {
                return Ok(Some(2 * i + 1));
            }
        }
        Ok(None)
    }
}

/// An array over one block, one element per position.
#[derive(Clone, Debug)]
pub struct BlockArray {
    block: Block,
    element_type: DataType,
    ops: Arc<dyn OperatorRegistry>,
}

impl BlockArray {
    pub fn new(block: Block, element_type: DataType, ops: Arc<dyn OperatorRegistry>) -> Self {
        Self {
            block,
            element_type,
            ops,
        }
    }

    pub fn data_type(&self) -> DataType {
        DataType::array(self.element_type.clone())
    }

    pub fn size(&self) -> usize {
        self.block.position_count()
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn get(&self, index: usize) -> Result<Option<Datum>, AdapterError> {
        if index >= self.block.position_count() {
            return Ok(None);
        }
        wrap_slot(&self.block, index, &self.element_type, &self.ops)
    }

    /// Rebuild the block with `element` appended.
    pub fn append(&mut self, element: &Datum) -> Result<(), AdapterError> {
        let form = element.to_canonical()?;
        let mut builder = BlockBuilder::new();
        for pos in 0..self.block.position_count() {
            builder.append_from(&self.block, pos)?;
        }
        codec::append_canonical(&mut builder, &self.element_type, &form)?;
        self.block = builder.build();
        Ok(())
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        (0..self.size()).map(move |pos| wrap_slot(&self.block, pos, &self.element_type, &self.ops))
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        let mut items = Vec::with_capacity(self.size());
        for pos in 0..self.size() {
            items.push(codec::decode_slot(&self.element_type, &self.block, pos)?);
        }
        Ok(Canonical::Array(items))
    }
}

/// A struct over one block, one field per position.
#[derive(Clone, Debug)]
pub struct BlockStruct {
    block: Block,
    fields: Vec<StructField>,
    ops: Arc<dyn OperatorRegistry>,
}

impl BlockStruct {
    pub fn new(
        block: Block,
        fields: Vec<StructField>,
        ops: Arc<dyn OperatorRegistry>,
    ) -> Result<Self, AdapterError> {
        if block.position_count() != fields.len() {
            return Err(AdapterError::MalformedBlock(format!(
                "struct block with {} positions for {} fields",
                block.position_count(),
                fields.len()
            )));
        }
        Ok(Self { block, fields, ops })
    }

    pub fn data_type(&self) -> DataType {
        DataType::Struct(self.fields.clone())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn field(&self, index: usize) -> Result<Option<Datum>, AdapterError> {
        if index >= self.fields.len() {
            return Ok(None);
        }
        wrap_slot(&self.block, index, &self.fields[index].data_type, &self.ops)
    }

    pub fn field_by_name(&self, name: &str) -> Result<Option<Datum>, AdapterError> {
        match self.fields.iter().position(|f| f.name == name) {
            Some(idx) => self.field(idx),
            None => Ok(None),
        }
    }

    /// Rebuild the block with the slot at `index` replaced.
    pub fn set_field(&mut self, index: usize, value: &Datum) -> Result<(), AdapterError> {
        if index >= self.fields.len() {
            return Err(AdapterError::Mutation(format!(
                "struct field index {index} out of range for {} fields",
                self.fields.len()
            )));
        }
        let form = value.to_canonical()?;
        let mut builder = BlockBuilder::new();
        for pos in 0..self.fields.len() {
            if pos == index {
                codec::append_canonical(&mut builder, &self.fields[pos].data_type, &form)?;
            } else {
                builder.append_from(&self.block, pos)?;
            }
        }
        self.block = builder.build();
        Ok(())
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        let mut values = Vec::with_capacity(self.fields.len());
        for (pos, field) in self.fields.iter().enumerate() {
            values.push(codec::decode_slot(&field.data_type, &self.block, pos)?);
        }
        Ok(Canonical::Struct(values))
    }
}

/// Wrap one slot of `block` as a portable datum. Primitives decode eagerly;
/// containers keep their nested block and decode on access.
pub(crate) fn wrap_slot(
    block: &Block,
    position: usize,
    data_type: &DataType,
    ops: &Arc<dyn OperatorRegistry>,
) -> Result<Option<Datum>, AdapterError> {
    let Some(bytes) = block.slot(position)? else {
        return Ok(None);
    };
    let datum = match data_type {
        DataType::Integer => match codec::decode(data_type, bytes)? {
            Canonical::Integer(v) => Datum::Integer(IntegerDatum::Block(v)),
            other => {
                return Err(AdapterError::MalformedBlock(format!(
                    "integer slot decoded to {other:?}"
                )));
            }
        },
        DataType::Long => match codec::decode(data_type, bytes)? {
            Canonical::Long(v) => Datum::Long(LongDatum::Block(v)),
            other => {
                return Err(AdapterError::MalformedBlock(format!(
                    "long slot decoded to {other:?}"
                )));
            }
        },
        DataType::Boolean => match codec::decode(data_type, bytes)? {
            Canonical::Boolean(v) => Datum::Boolean(BooleanDatum::Block(v)),
            other => {
                return Err(AdapterError::MalformedBlock(format!(
                    "boolean slot decoded to {other:?}"
                )));
            }
        },
        DataType::String => match codec::decode(data_type, bytes)? {
            Canonical::String(s) => Datum::String(StringDatum::Block(s)),
            other => {
                return Err(AdapterError::MalformedBlock(format!(
                    "string slot decoded to {other:?}"
                )));
            }
        },
        DataType::Array(element) => Datum::Array(ArrayDatum::Block(BlockArray::new(
            Block::from_bytes(bytes)?,
            element.as_ref().clone(),
            ops.clone(),
        ))),
        DataType::Map(key, value) => Datum::Map(MapDatum::Block(BlockMap::new(
            Block::from_bytes(bytes)?,
            key.as_ref().clone(),
            value.as_ref().clone(),
            ops.clone(),
        )?)),
        DataType::Struct(fields) => Datum::Struct(StructDatum::Block(BlockStruct::new(
            Block::from_bytes(bytes)?,
            fields.clone(),
            ops.clone(),
        )?)),
    };
    Ok(Some(datum))
}

/// Wrap the slot at `position` under an engine type tag. `Void` yields the
/// null representation; unsupported engine types fail loudly.
pub fn wrap(
    block: &Block,
    position: usize,
    engine: &EngineType,
    ops: &Arc<dyn OperatorRegistry>,
) -> Result<Option<Datum>, AdapterError> {
    let Some(ty) = data_type(engine)? else {
        return Ok(None);
    };
    wrap_slot(block, position, &ty, ops)
}

/// Append a datum to an output block. Block-backed containers of the exact
/// target type pass their backing block through verbatim; everything else
/// is re-encoded from standard form.
pub fn write_datum(
    builder: &mut BlockBuilder,
    datum: Option<&Datum>,
    data_type: &DataType,
) -> Result<(), AdapterError> {
    let Some(datum) = datum else {
        builder.append_null();
        return Ok(());
    };
    match datum {
        Datum::Array(ArrayDatum::Block(array)) if array.data_type() == *data_type => {
            builder.append_slot(&array.block().to_bytes());
            Ok(())
        }
        Datum::Map(MapDatum::Block(map)) if map.data_type() == *data_type => {
            builder.append_slot(&map.block().to_bytes());
            Ok(())
        }
        Datum::Struct(StructDatum::Block(row)) if row.data_type() == *data_type => {
            builder.append_slot(&row.block().to_bytes());
            Ok(())
        }
        datum => codec::append_canonical(builder, data_type, &datum.to_canonical()?),
    }
}

/// Factory for the block backend: every fresh container starts from an
/// empty block and grows by rebuilds.
#[derive(Debug)]
pub struct BlockFactory {
    ops: Arc<dyn OperatorRegistry>,
}

impl BlockFactory {
    pub fn new(ops: Arc<dyn OperatorRegistry>) -> Self {
        Self { ops }
    }
}

impl DatumFactory for BlockFactory {
    fn new_integer(&self, value: i32) -> Datum {
        Datum::Integer(IntegerDatum::Block(value))
    }

    fn new_long(&self, value: i64) -> Datum {
        Datum::Long(LongDatum::Block(value))
    }

    fn new_boolean(&self, value: bool) -> Datum {
        Datum::Boolean(BooleanDatum::Block(value))
    }

    fn new_string(&self, value: &str) -> Datum {
        Datum::String(StringDatum::Block(value.to_string()))
    }

    fn new_array(&self, element_type: &DataType) -> Result<Datum, AdapterError> {
        Ok(Datum::Array(ArrayDatum::Block(BlockArray::new(
            Block::empty(),
            element_type.clone(),
            self.ops.clone(),
        ))))
    }

    fn new_map(&self, key_type: &DataType, value_type: &DataType) -> Result<Datum, AdapterError> {
        Ok(Datum::Map(MapDatum::Block(BlockMap::new(
            Block::empty(),
            key_type.clone(),
            value_type.clone(),
            self.ops.clone(),
        )?)))
    }

    fn new_struct(&self, fields: &[StructField]) -> Result<Datum, AdapterError> {
        let mut builder = BlockBuilder::new();
        for _ in fields {
            builder.append_null();
        }
        Ok(Datum::Struct(StructDatum::Block(BlockStruct::new(
            builder.build(),
            fields.to_vec(),
            self.ops.clone(),
        )?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<dyn OperatorRegistry> {
        Arc::new(NativeOperators)
    }

    fn long_string_map(entries: &[(Option<i64>, Option<&str>)]) -> BlockMap {
        let mut builder = BlockBuilder::new();
        for (k, v) in entries {
            match k {
                Some(k) => builder.append_slot(&k.to_le_bytes()),
                None => builder.append_null(),
            }
            match v {
                Some(v) => builder.append_slot(v.as_bytes()),
                None => builder.append_null(),
            }
        }
        BlockMap::new(builder.build(), DataType::Long, DataType::String, registry())
            .expect("map")
    }

    fn long_key(factory: &BlockFactory, value: i64) -> Datum {
        factory.new_long(value)
    }

    #[test]
    fn seek_finds_keys_written_in_either_integer_width() {
        // One key written compact (4 bytes), one wide (8 bytes); equality is
        // over decoded values, not raw slot bytes.
        let mut builder = BlockBuilder::new();
        builder.append_slot(&10i32.to_le_bytes());
        builder.append_slot(b"ten");
        builder.append_slot(&20i64.to_le_bytes());
        builder.append_slot(b"twenty");
        let map = BlockMap::new(builder.build(), DataType::Long, DataType::String, registry())
            .expect("map");
        let factory = BlockFactory::new(registry());
        for (key, expect) in [(10, "ten"), (20, "twenty")] {
            match map.get(&long_key(&factory, key)).expect("get").expect("hit") {
                Datum::String(s) => assert_eq!(s.value().unwrap(), expect),
                other => panic!("unexpected datum: {other:?}"),
            }
        }
        assert!(map.get(&long_key(&factory, 30)).expect("get").is_none());
    }

    #[test]
    fn null_probe_matches_only_null_key_slot() {
        let map = long_string_map(&[(Some(1), Some("a")), (None, Some("for-null"))]);
        let null_key = Datum::Long(LongDatum::Boxed(crate::boxed::BoxedPrimitive::new(
            crate::boxed::BoxedObject::Null,
            crate::boxed::Inspector::Long(crate::boxed::Encoding::Standard),
        )));
        match map.get(&null_key).expect("get").expect("hit") {
            Datum::String(s) => assert_eq!(s.value().unwrap(), "for-null"),
            other => panic!("unexpected datum: {other:?}"),
        }
    }

    #[test]
    fn put_replaces_value_and_replays_untouched_slots_verbatim() {
        let mut map = long_string_map(&[(Some(1), Some("a")), (Some(2), Some("b"))]);
        let before_first_key = map.block().slot(0).unwrap().map(<[u8]>::to_vec);
        let factory = BlockFactory::new(registry());
        map.put(&long_key(&factory, 2), &factory.new_string("bb"))
            .expect("replace");
        assert_eq!(map.size(), 2);
        assert_eq!(
            map.block().slot(0).unwrap().map(<[u8]>::to_vec),
            before_first_key
        );
        match map.get(&long_key(&factory, 2)).expect("get").expect("hit") {
            Datum::String(s) => assert_eq!(s.value().unwrap(), "bb"),
            other => panic!("unexpected datum: {other:?}"),
        }

        map.put(&long_key(&factory, 3), &factory.new_string("c"))
            .expect("append");
        assert_eq!(map.size(), 3);
        assert!(map.contains_key(&long_key(&factory, 3)).expect("contains"));
    }

    #[test]
    fn put_does_not_disturb_previously_captured_blocks() {
        let mut map = long_string_map(&[(Some(1), Some("a"))]);
        let captured = map.clone();
        let factory = BlockFactory::new(registry());
        map.put(&long_key(&factory, 1), &factory.new_string("changed"))
            .expect("put");
        match captured
            .get(&long_key(&factory, 1))
            .expect("get")
            .expect("hit")
        {
            Datum::String(s) => assert_eq!(s.value().unwrap(), "a"),
            other => panic!("unexpected datum: {other:?}"),
        }
    }

    #[test]
    fn map_typed_keys_fail_operator_resolution_at_construction() {
        let key_type = DataType::map(DataType::Integer, DataType::Integer);
        let err = BlockMap::new(Block::empty(), key_type, DataType::String, registry())
            .expect_err("unresolvable");
        assert!(
            matches!(err, AdapterError::OperatorResolution { .. }),
            "err={err}"
        );
    }

    #[test]
    fn odd_position_count_is_rejected() {
        let mut builder = BlockBuilder::new();
        builder.append_slot(&1i64.to_le_bytes());
        let err = BlockMap::new(builder.build(), DataType::Long, DataType::String, registry())
            .expect_err("odd");
        assert!(matches!(err, AdapterError::MalformedBlock(_)), "err={err}");
    }

    #[test]
    fn array_get_past_end_is_absent_and_append_rebuilds() {
        let factory = BlockFactory::new(registry());
        let mut array = match factory.new_array(&DataType::Integer).expect("array") {
            Datum::Array(ArrayDatum::Block(array)) => array,
            other => panic!("unexpected datum: {other:?}"),
        };
        assert!(array.get(0).expect("get").is_none());
        array.append(&factory.new_integer(5)).expect("append");
        array.append(&factory.new_integer(6)).expect("append");
        assert_eq!(array.size(), 2);
        match array.get(1).expect("get").expect("hit") {
            Datum::Integer(i) => assert_eq!(i.value().unwrap(), 6),
            other => panic!("unexpected datum: {other:?}"),
        }
    }

    #[test]
    fn struct_set_field_rebuilds_single_slot() {
        let factory = BlockFactory::new(registry());
        let fields = vec![
            StructField::new("id", DataType::Integer),
            StructField::new("name", DataType::String),
        ];
        let mut row = match factory.new_struct(&fields).expect("struct") {
            Datum::Struct(StructDatum::Block(row)) => row,
            other => panic!("unexpected datum: {other:?}"),
        };
        assert!(row.field(0).expect("field").is_none());
        row.set_field(1, &factory.new_string("x")).expect("set");
        match row.field_by_name("name").expect("field").expect("hit") {
            Datum::String(s) => assert_eq!(s.value().unwrap(), "x"),
            other => panic!("unexpected datum: {other:?}"),
        }
        assert!(row.field(0).expect("field").is_none());
        let err = row
            .set_field(9, &factory.new_string("x"))
            .expect_err("out of range");
        assert!(matches!(err, AdapterError::Mutation(_)));
    }

    #[test]
    fn nested_map_values_stay_block_backed() {
        let inner_type = DataType::map(DataType::Integer, DataType::Integer);
        let mut inner = BlockBuilder::new();
        inner.append_slot(&1i32.to_le_bytes());
        inner.append_slot(&100i32.to_le_bytes());
        let inner_bytes = inner.build().to_bytes();

        let mut builder = BlockBuilder::new();
        builder.append_slot(b"outer");
        builder.append_slot(&inner_bytes);
        let map = BlockMap::new(builder.build(), DataType::String, inner_type, registry())
            .expect("map");

        let factory = BlockFactory::new(registry());
        let nested = map
            .get(&factory.new_string("outer"))
            .expect("get")
            .expect("hit");
        let nested = nested.as_map().expect("map datum");
        assert!(matches!(nested, MapDatum::Block(_)));
        match nested.get(&factory.new_integer(1)).expect("get").expect("hit") {
            Datum::Integer(i) => assert_eq!(i.value().unwrap(), 100),
            other => panic!("unexpected datum: {other:?}"),
        }
    }

    #[test]
    fn write_datum_passes_same_typed_block_container_through() {
        let factory = BlockFactory::new(registry());
        let mut array = factory.new_array(&DataType::Integer).expect("array");
        array
            .as_array_mut()
            .unwrap()
            .append(&factory.new_integer(9))
            .expect("append");
        let ty = DataType::array(DataType::Integer);
        let mut builder = BlockBuilder::new();
        write_datum(&mut builder, Some(&array), &ty).expect("write");
        write_datum(&mut builder, None, &ty).expect("write null");
        let out = builder.build();
        assert_eq!(out.position_count(), 2);
        let replayed = match array {
            Datum::Array(ArrayDatum::Block(a)) => a.block().to_bytes(),
            other => panic!("unexpected datum: {other:?}"),
        };
        assert_eq!(out.slot(0).unwrap(), Some(replayed.as_slice()));
        assert_eq!(out.slot(1).unwrap(), None);
    }
}
