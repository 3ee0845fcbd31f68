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
use std::fmt;

use crate::block::{BlockArray, BlockMap, BlockStruct};
use crate::boxed::{BoxedArray, BoxedMap, BoxedPrimitive, BoxedStruct};
use crate::common::error::AdapterError;

/// One field of a struct shape: a stable name and an independent type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub data_type: DataType,
}

impl StructField {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// The shape of a portable value. Created once per distinct shape and shared
/// by reference; equality is structural (same tag, same nested types).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Long,
    Boolean,
    String,
    Array(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    Struct(Vec<StructField>),
}

impl DataType {
    pub fn array(element: DataType) -> Self {
        DataType::Array(Box::new(element))
    }

    pub fn map(key: DataType, value: DataType) -> Self {
        DataType::Map(Box::new(key), Box::new(value))
    }

    pub fn key_type(&self) -> Option<&DataType> {
        match self {
            DataType::Map(key, _) => Some(key),
            _ => None,
        }
    }

    pub fn value_type(&self) -> Option<&DataType> {
        match self {
            DataType::Map(_, value) => Some(value),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&DataType> {
        match self {
            DataType::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&[StructField]> {
        match self {
            DataType::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "INTEGER"),
            DataType::Long => write!(f, "BIGINT"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::String => write!(f, "VARCHAR"),
            DataType::Array(element) => write!(f, "ARRAY<{}>", element),
            DataType::Map(key, value) => write!(f, "MAP<{},{}>", key, value),
            DataType::Struct(fields) => {
                write!(f, "ROW<")?;
                for (idx, field) in fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", field.name, field.data_type)?;
                }
                write!(f, ">")
            }
        }
    }
}

/// Backend-agnostic standard form of a value. Used as the fallback
/// representation when two native encodings disagree, and as the exchange
/// form when a value produced by one backend is inserted into a container
/// of the other.
#[derive(Clone, Debug, PartialEq)]
pub enum Canonical {
    Null,
    Integer(i32),
    Long(i64),
    Boolean(bool),
    String(String),
    Array(Vec<Canonical>),
    Map(Vec<(Canonical, Canonical)>),
    Struct(Vec<Canonical>),
}

/// A portable value. Each variant owns exactly one native representation:
/// a boxed object plus its inspector, or a decoded columnar slot / nested
/// block. UDF bodies operate purely through this facade, so either backend
/// can be substituted without changing UDF logic.
#[derive(Clone, Debug)]
pub enum Datum {
    Integer(IntegerDatum),
    Long(LongDatum),
    Boolean(BooleanDatum),
    String(StringDatum),
    Array(ArrayDatum),
    Map(MapDatum),
    Struct(StructDatum),
}

impl Datum {
    pub fn data_type(&self) -> DataType {
        match self {
            Datum::Integer(_) => DataType::Integer,
            Datum::Long(_) => DataType::Long,
            Datum::Boolean(_) => DataType::Boolean,
            Datum::String(_) => DataType::String,
            Datum::Array(array) => array.data_type(),
            Datum::Map(map) => map.data_type(),
            Datum::Struct(row) => row.data_type(),
        }
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        match self {
            Datum::Integer(datum) => datum.to_canonical(),
            Datum::Long(datum) => datum.to_canonical(),
            Datum::Boolean(datum) => datum.to_canonical(),
            Datum::String(datum) => datum.to_canonical(),
            Datum::Array(array) => array.to_canonical(),
            Datum::Map(map) => map.to_canonical(),
            Datum::Struct(row) => row.to_canonical(),
        }
    }

    pub fn as_map(&self) -> Option<&MapDatum> {
        match self {
            Datum::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut MapDatum> {
        match self {
            Datum::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayDatum> {
        match self {
            Datum::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ArrayDatum> {
        match self {
            Datum::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructDatum> {
        match self {
            Datum::Struct(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructDatum> {
        match self {
            Datum::Struct(row) => Some(row),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum IntegerDatum {
    Boxed(BoxedPrimitive),
    Block(i32),
}

impl IntegerDatum {
    pub fn value(&self) -> Result<i32, AdapterError> {
        match self {
            IntegerDatum::Boxed(primitive) => primitive.as_i32(),
            IntegerDatum::Block(value) => Ok(*value),
        }
    }

    /// Standard form of this datum. Unlike [`IntegerDatum::value`], a boxed
    /// null decodes to [`Canonical::Null`] rather than an error.
    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        match self {
            IntegerDatum::Boxed(primitive) => primitive.to_canonical(),
            IntegerDatum::Block(value) => Ok(Canonical::Integer(*value)),
        }
    }
}

#[derive(Clone, Debug)]
pub enum LongDatum {
    Boxed(BoxedPrimitive),
    Block(i64),
}

impl LongDatum {
    pub fn value(&self) -> Result<i64, AdapterError> {
        match self {
            LongDatum::Boxed(primitive) => primitive.as_i64(),
            LongDatum::Block(value) => Ok(*value),
        }
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        match self {
            LongDatum::Boxed(primitive) => primitive.to_canonical(),
            LongDatum::Block(value) => Ok(Canonical::Long(*value)),
        }
    }
}

#[derive(Clone, Debug)]
pub enum BooleanDatum {
    Boxed(BoxedPrimitive),
    Block(bool),
}

impl BooleanDatum {
    pub fn value(&self) -> Result<bool, AdapterError> {
        match self {
            BooleanDatum::Boxed(primitive) => primitive.as_bool(),
            BooleanDatum::Block(value) => Ok(*value),
        }
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        match self {
            BooleanDatum::Boxed(primitive) => primitive.to_canonical(),
            BooleanDatum::Block(value) => Ok(Canonical::Boolean(*value)),
        }
    }
}

#[derive(Clone, Debug)]
pub enum StringDatum {
    Boxed(BoxedPrimitive),
    Block(String),
}

impl StringDatum {
    pub fn value(&self) -> Result<&str, AdapterError> {
        match self {
            StringDatum::Boxed(primitive) => primitive.as_str(),
            StringDatum::Block(value) => Ok(value),
        }
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        match self {
            StringDatum::Boxed(primitive) => primitive.to_canonical(),
            StringDatum::Block(value) => Ok(Canonical::String(value.clone())),
        }
    }
}

/// An iterator item from a container view: a decode failure, a null element,
/// or a wrapped child datum.
pub type Element = Result<Option<Datum>, AdapterError>;

#[derive(Clone, Debug)]
pub enum MapDatum {
    Boxed(BoxedMap),
    Block(BlockMap),
}

impl MapDatum {
    pub fn data_type(&self) -> DataType {
        match self {
            MapDatum::Boxed(map) => map.data_type(),
            MapDatum::Block(map) => map.data_type(),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            MapDatum::Boxed(map) => map.size(),
            MapDatum::Block(map) => map.size(),
        }
    }

    /// Look up `key`, returning the wrapped value or `None` when absent.
    pub fn get(&self, key: &Datum) -> Result<Option<Datum>, AdapterError> {
        match self {
            MapDatum::Boxed(map) => map.get(key),
            MapDatum::Block(map) => map.get(key),
        }
    }

    pub fn contains_key(&self, key: &Datum) -> Result<bool, AdapterError> {
        match self {
            MapDatum::Boxed(map) => map.contains_key(key),
            MapDatum::Block(map) => map.contains_key(key),
        }
    }

    /// Associate `key` with `value`, replacing any existing entry for an
    /// equal key. Boxed containers must be settable; block containers are
    /// rebuilt wholesale.
    pub fn put(&mut self, key: &Datum, value: &Datum) -> Result<(), AdapterError> {
        match self {
            MapDatum::Boxed(map) => map.put(key, value),
            MapDatum::Block(map) => map.put(key, value),
        }
    }

    pub fn keys(&self) -> Box<dyn Iterator<Item = Element> + '_> {
        match self {
            MapDatum::Boxed(map) => Box::new(map.keys()),
            MapDatum::Block(map) => Box::new(map.keys()),
        }
    }

    pub fn values(&self) -> Box<dyn Iterator<Item = Element> + '_> {
        match self {
            MapDatum::Boxed(map) => Box::new(map.values()),
            MapDatum::Block(map) => Box::new(map.values()),
        }
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        match self {
            MapDatum::Boxed(map) => map.to_canonical(),
            MapDatum::Block(map) => map.to_canonical(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum ArrayDatum {
    Boxed(BoxedArray),
    Block(BlockArray),
}

impl ArrayDatum {
    pub fn data_type(&self) -> DataType {
        match self {
            ArrayDatum::Boxed(array) => array.data_type(),
            ArrayDatum::Block(array) => array.data_type(),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            ArrayDatum::Boxed(array) => array.size(),
            ArrayDatum::Block(array) => array.size(),
        }
    }

    /// Element at `index`, or `None` when the slot is null or out of range.
    pub fn get(&self, index: usize) -> Result<Option<Datum>, AdapterError> {
        match self {
            ArrayDatum::Boxed(array) => array.get(index),
            ArrayDatum::Block(array) => array.get(index),
        }
    }

    pub fn append(&mut self, element: &Datum) -> Result<(), AdapterError> {
        match self {
            ArrayDatum::Boxed(array) => array.append(element),
            ArrayDatum::Block(array) => array.append(element),
        }
    }

    pub fn elements(&self) -> Box<dyn Iterator<Item = Element> + '_> {
        match self {
            ArrayDatum::Boxed(array) => Box::new(array.elements()),
            ArrayDatum::Block(array) => Box::new(array.elements()),
        }
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        match self {
            ArrayDatum::Boxed(array) => array.to_canonical(),
            ArrayDatum::Block(array) => array.to_canonical(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum StructDatum {
    Boxed(BoxedStruct),
    Block(BlockStruct),
}

impl StructDatum {
    pub fn data_type(&self) -> DataType {
        match self {
            StructDatum::Boxed(row) => row.data_type(),
            StructDatum::Block(row) => row.data_type(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StructDatum::Boxed(row) => row.len(),
            StructDatum::Block(row) => row.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn field(&self, index: usize) -> Result<Option<Datum>, AdapterError> {
        match self {
            StructDatum::Boxed(row) => row.field(index),
            StructDatum::Block(row) => row.field(index),
        }
    }

    pub fn field_by_name(&self, name: &str) -> Result<Option<Datum>, AdapterError> {
        match self {
            StructDatum::Boxed(row) => row.field_by_name(name),
            StructDatum::Block(row) => row.field_by_name(name),
        }
    }

    pub fn set_field(&mut self, index: usize, value: &Datum) -> Result<(), AdapterError> {
        match self {
            StructDatum::Boxed(row) => row.set_field(index, value),
            StructDatum::Block(row) => row.set_field(index, value),
        }
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        match self {
            StructDatum::Boxed(row) => row.to_canonical(),
            StructDatum::Block(row) => row.to_canonical(),
        }
    }
}

/// Constructor registry for one backend. Shared by every datum produced
/// during a UDF invocation; carries no call-specific state.
pub trait DatumFactory: fmt::Debug {
    fn new_integer(&self, value: i32) -> Datum;
    fn new_long(&self, value: i64) -> Datum;
    fn new_boolean(&self, value: bool) -> Datum;
    fn new_string(&self, value: &str) -> Datum;
    fn new_array(&self, element_type: &DataType) -> Result<Datum, AdapterError>;
    fn new_map(&self, key_type: &DataType, value_type: &DataType) -> Result<Datum, AdapterError>;
    fn new_struct(&self, fields: &[StructField]) -> Result<Datum, AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_equality_is_structural() {
        let a = DataType::map(DataType::Integer, DataType::String);
        let b = DataType::map(DataType::Integer, DataType::String);
        assert_eq!(a, b);
        assert_ne!(a, DataType::map(DataType::Long, DataType::String));
    }

    #[test]
    fn data_type_accessors_match_kind() {
        let map = DataType::map(DataType::Integer, DataType::String);
        assert_eq!(map.key_type(), Some(&DataType::Integer));
        assert_eq!(map.value_type(), Some(&DataType::String));
        assert_eq!(map.element_type(), None);

        let array = DataType::array(DataType::Boolean);
        assert_eq!(array.element_type(), Some(&DataType::Boolean));
        assert_eq!(array.key_type(), None);

        let row = DataType::Struct(vec![
            StructField::new("a", DataType::Integer),
            StructField::new("b", DataType::String),
        ]);
        assert_eq!(row.fields().map(|f| f.len()), Some(2));
    }

    #[test]
    fn data_type_display_is_sql_like() {
        let ty = DataType::map(DataType::Integer, DataType::array(DataType::String));
        assert_eq!(ty.to_string(), "MAP<INTEGER,ARRAY<VARCHAR>>");
        let row = DataType::Struct(vec![StructField::new("x", DataType::Long)]);
        assert_eq!(row.to_string(), "ROW<x:BIGINT>");
    }
}
