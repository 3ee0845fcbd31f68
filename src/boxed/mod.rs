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

//! Boxed-object backend: values reached through a per-value "inspector"
//! that knows how to traverse the native object without the adapter knowing
//! its concrete encoding. Containers declared settable are mutated in
//! place; no operation copies the whole container.

use crate::common::error::AdapterError;
use crate::data::{
    ArrayDatum, BooleanDatum, Canonical, DataType, Datum, DatumFactory, Element, IntegerDatum,
    LongDatum, MapDatum, StringDatum, StructDatum, StructField,
};

/// How a primitive is physically held by the row engine: a plain native
/// value, or text-serialized the way lazy row serdes keep it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Standard,
    Text,
}

/// Native shape descriptor, resolved once at wrap time. The trailing
/// variants are shapes the row engine knows but the portable layer does
/// not; dispatching them is an integration error.
#[derive(Clone, Debug, PartialEq)]
pub enum Inspector {
    Integer(Encoding),
    Long(Encoding),
    Boolean(Encoding),
    String(Encoding),
    List {
        element: Box<Inspector>,
        settable: bool,
    },
    Map {
        key: Box<Inspector>,
        value: Box<Inspector>,
        settable: bool,
    },
    Struct {
        fields: Vec<(String, Inspector)>,
        settable: bool,
    },
    Void,
    Double,
    Binary,
    Decimal {
        precision: u8,
        scale: u8,
    },
    Timestamp,
}

/// A native boxed value. `Lazy` holds a primitive in its text-serialized
/// row encoding; the inspector says which logical type it carries.
#[derive(Clone, Debug, PartialEq)]
pub enum BoxedObject {
    Null,
    Int(i32),
    Long(i64),
    Bool(bool),
    Text(String),
    Lazy(String),
    List(Vec<BoxedObject>),
    Map(Vec<(BoxedObject, BoxedObject)>),
    Struct(Vec<BoxedObject>),
}

/// Portable shape for an inspector: `None` for `Void`, error for shapes the
/// portable layer does not support.
pub fn data_type(inspector: &Inspector) -> Result<Option<DataType>, AdapterError> {
    match inspector {
        Inspector::Integer(_) => Ok(Some(DataType::Integer)),
        Inspector::Long(_) => Ok(Some(DataType::Long)),
        Inspector::Boolean(_) => Ok(Some(DataType::Boolean)),
        Inspector::String(_) => Ok(Some(DataType::String)),
        Inspector::List { element, .. } => {
            let element = data_type(element)?
                .ok_or_else(|| AdapterError::UnsupportedShape("void list element".to_string()))?;
            Ok(Some(DataType::array(element)))
        }
        Inspector::Map { key, value, .. } => {
            let key = data_type(key)?
                .ok_or_else(|| AdapterError::UnsupportedShape("void map key".to_string()))?;
            let value = data_type(value)?
                .ok_or_else(|| AdapterError::UnsupportedShape("void map value".to_string()))?;
            Ok(Some(DataType::map(key, value)))
        }
        Inspector::Struct { fields, .. } => {
            let mut out = Vec::with_capacity(fields.len());
            for (name, inspector) in fields {
                let field = data_type(inspector)?.ok_or_else(|| {
                    AdapterError::UnsupportedShape(format!("void struct field {name}"))
                })?;
                out.push(StructField::new(name.clone(), field));
            }
            Ok(Some(DataType::Struct(out)))
        }
        Inspector::Void => Ok(None),
        other => Err(AdapterError::UnsupportedShape(format!(
            "boxed inspector {other:?}"
        ))),
    }
}

/// Wrap a native object into a portable datum. `Void` inspectors and null
/// objects yield the null representation; unrecognized inspectors fail
/// loudly rather than producing a silent null.
pub fn wrap(object: BoxedObject, inspector: &Inspector) -> Result<Option<Datum>, AdapterError> {
    let Some(_) = data_type(inspector)? else {
        return Ok(None);
    };
    if matches!(object, BoxedObject::Null) {
        return Ok(None);
    }
    let datum = match inspector {
        Inspector::Integer(_) => {
            Datum::Integer(IntegerDatum::Boxed(BoxedPrimitive::new(object, inspector.clone())))
        }
        Inspector::Long(_) => {
            Datum::Long(LongDatum::Boxed(BoxedPrimitive::new(object, inspector.clone())))
        }
        Inspector::Boolean(_) => {
            Datum::Boolean(BooleanDatum::Boxed(BoxedPrimitive::new(object, inspector.clone())))
        }
        Inspector::String(_) => {
            Datum::String(StringDatum::Boxed(BoxedPrimitive::new(object, inspector.clone())))
        }
        Inspector::List { element, settable } => Datum::Array(ArrayDatum::Boxed(
            BoxedArray::new(object, element.as_ref().clone(), *settable)?,
        )),
        Inspector::Map {
            key,
            value,
            settable,
        } => Datum::Map(MapDatum::Boxed(BoxedMap::new(
            object,
            key.as_ref().clone(),
            value.as_ref().clone(),
            *settable,
        )?)),
        Inspector::Struct { fields, settable } => Datum::Struct(StructDatum::Boxed(
            BoxedStruct::new(object, fields.clone(), *settable)?,
        )),
        other => {
            return Err(AdapterError::UnsupportedShape(format!(
                "boxed inspector {other:?}"
            )));
        }
    };
    Ok(Some(datum))
}

/// The native object a boxed datum currently holds, for handing back to the
/// engine at egress.
pub fn native_object(datum: &Datum) -> Result<BoxedObject, AdapterError> {
    match datum {
        Datum::Integer(IntegerDatum::Boxed(p))
        | Datum::Long(LongDatum::Boxed(p))
        | Datum::Boolean(BooleanDatum::Boxed(p))
        | Datum::String(StringDatum::Boxed(p)) => Ok(p.object().clone()),
        Datum::Array(ArrayDatum::Boxed(array)) => Ok(array.to_object()),
        Datum::Map(MapDatum::Boxed(map)) => Ok(map.to_object()),
        Datum::Struct(StructDatum::Boxed(row)) => Ok(row.to_object()),
        other => Err(AdapterError::UnsupportedShape(format!(
            "datum of type {} is not boxed-backed",
            other.data_type()
        ))),
    }
}

/// Decode a native object into the backend-agnostic standard form.
pub fn canonicalize(
    object: &BoxedObject,
    inspector: &Inspector,
) -> Result<Canonical, AdapterError> {
    match (inspector, object) {
        (_, BoxedObject::Null) => Ok(Canonical::Null),
        (Inspector::Integer(_), BoxedObject::Int(v)) => Ok(Canonical::Integer(*v)),
        (Inspector::Integer(_), BoxedObject::Lazy(s)) => s
            .trim()
            .parse::<i32>()
            .map(Canonical::Integer)
            .map_err(|_| AdapterError::KeyConversion(format!("lazy integer {s:?}"))),
        (Inspector::Long(_), BoxedObject::Long(v)) => Ok(Canonical::Long(*v)),
        (Inspector::Long(_), BoxedObject::Lazy(s)) => s
            .trim()
            .parse::<i64>()
            .map(Canonical::Long)
            .map_err(|_| AdapterError::KeyConversion(format!("lazy long {s:?}"))),
        (Inspector::Boolean(_), BoxedObject::Bool(v)) => Ok(Canonical::Boolean(*v)),
        (Inspector::Boolean(_), BoxedObject::Lazy(s)) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") => Ok(Canonical::Boolean(true)),
            t if t.eq_ignore_ascii_case("false") => Ok(Canonical::Boolean(false)),
            _ => Err(AdapterError::KeyConversion(format!("lazy boolean {s:?}"))),
        },
        (Inspector::String(_), BoxedObject::Text(s))
        | (Inspector::String(_), BoxedObject::Lazy(s)) => Ok(Canonical::String(s.clone())),
        (Inspector::List { element, .. }, BoxedObject::List(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(canonicalize(item, element)?);
            }
            Ok(Canonical::Array(out))
        }
        (Inspector::Map { key, value, .. }, BoxedObject::Map(entries)) => {
            let mut out = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                out.push((canonicalize(k, key)?, canonicalize(v, value)?));
            }
            Ok(Canonical::Map(out))
        }
        (Inspector::Struct { fields, .. }, BoxedObject::Struct(values)) => {
            if fields.len() != values.len() {
                return Err(AdapterError::KeyConversion(format!(
                    "struct arity mismatch: {} fields, {} values",
                    fields.len(),
                    values.len()
                )));
            }
            let mut out = Vec::with_capacity(values.len());
            for ((_, inspector), value) in fields.iter().zip(values) {
                out.push(canonicalize(value, inspector)?);
            }
            Ok(Canonical::Struct(out))
        }
        (inspector, object) => Err(AdapterError::KeyConversion(format!(
            "native value {object:?} does not match inspector {inspector:?}"
        ))),
    }
}

/// Encode a standard-form value into the representation `inspector`
/// describes.
pub fn from_canonical(
    value: &Canonical,
    inspector: &Inspector,
) -> Result<BoxedObject, AdapterError> {
    match (inspector, value) {
        (_, Canonical::Null) => Ok(BoxedObject::Null),
        (Inspector::Integer(Encoding::Standard), Canonical::Integer(v)) => {
            Ok(BoxedObject::Int(*v))
        }
        (Inspector::Integer(Encoding::Text), Canonical::Integer(v)) => {
            Ok(BoxedObject::Lazy(v.to_string()))
        }
        (Inspector::Long(Encoding::Standard), Canonical::Long(v)) => Ok(BoxedObject::Long(*v)),
        (Inspector::Long(Encoding::Text), Canonical::Long(v)) => {
            Ok(BoxedObject::Lazy(v.to_string()))
        }
        (Inspector::Boolean(Encoding::Standard), Canonical::Boolean(v)) => {
            Ok(BoxedObject::Bool(*v))
        }
        (Inspector::Boolean(Encoding::Text), Canonical::Boolean(v)) => {
            Ok(BoxedObject::Lazy(v.to_string()))
        }
        (Inspector::String(Encoding::Standard), Canonical::String(s)) => {
            Ok(BoxedObject::Text(s.clone()))
        }
        (Inspector::String(Encoding::Text), Canonical::String(s)) => {
            Ok(BoxedObject::Lazy(s.clone()))
        }
        (Inspector::List { element, .. }, Canonical::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(from_canonical(item, element)?);
            }
            Ok(BoxedObject::List(out))
        }
        (Inspector::Map { key, value, .. }, Canonical::Map(entries)) => {
            let mut out = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                out.push((from_canonical(k, key)?, from_canonical(v, value)?));
            }
            Ok(BoxedObject::Map(out))
        }
        (Inspector::Struct { fields, .. }, Canonical::Struct(values)) => {
            if fields.len() != values.len() {
                return Err(AdapterError::KeyConversion(format!(
                    "struct arity mismatch: {} fields, {} values",
                    fields.len(),
                    values.len()
                )));
            }
            let mut out = Vec::with_capacity(values.len());
            for ((_, inspector), value) in fields.iter().zip(values) {
                out.push(from_canonical(value, inspector)?);
            }
            Ok(BoxedObject::Struct(out))
        }
        (inspector, value) => Err(AdapterError::KeyConversion(format!(
            "cannot encode {value:?} for inspector {inspector:?}"
        ))),
    }
}

/// Convert a native value from one inspector's representation to another.
/// Primitives re-encode through the standard form; differently-shaped
/// composites are not directly convertible, which is what triggers the
/// canonical fallback in map lookup.
pub fn convert_for(
    object: &BoxedObject,
    from: &Inspector,
    to: &Inspector,
) -> Result<BoxedObject, AdapterError> {
    if from == to {
        return Ok(object.clone());
    }
    match to {
        Inspector::Integer(_) | Inspector::Long(_) | Inspector::Boolean(_)
        | Inspector::String(_) => from_canonical(&canonicalize(object, from)?, to),
        _ => Err(AdapterError::KeyConversion(format!(
            "cannot convert {from:?} value to {to:?}"
        ))),
    }
}

fn native_of(datum: &Datum) -> Option<(&BoxedObject, &Inspector)> {
    match datum {
        Datum::Integer(IntegerDatum::Boxed(p))
        | Datum::Long(LongDatum::Boxed(p))
        | Datum::Boolean(BooleanDatum::Boxed(p))
        | Datum::String(StringDatum::Boxed(p)) => Some((p.object(), p.inspector())),
        _ => None,
    }
}

/// Render any datum in the representation `target` describes: the direct
/// inspector-to-inspector conversion when the datum is boxed-backed, the
/// standard form otherwise.
fn to_native(datum: &Datum, target: &Inspector) -> Result<BoxedObject, AdapterError> {
    if let Some((object, inspector)) = native_of(datum)
        && let Ok(converted) = convert_for(object, inspector, target)
    {
        return Ok(converted);
    }
    from_canonical(&datum.to_canonical()?, target)
}

/// A primitive native object together with the inspector that decodes it.
#[derive(Clone, Debug)]
pub struct BoxedPrimitive {
    object: BoxedObject,
    inspector: Inspector,
}

impl BoxedPrimitive {
    pub(crate) fn new(object: BoxedObject, inspector: Inspector) -> Self {
        Self { object, inspector }
    }

    pub fn object(&self) -> &BoxedObject {
        &self.object
    }

    pub fn inspector(&self) -> &Inspector {
        &self.inspector
    }

    pub fn as_i32(&self) -> Result<i32, AdapterError> {
        match canonicalize(&self.object, &self.inspector)? {
            Canonical::Integer(v) => Ok(v),
            other => Err(AdapterError::KeyConversion(format!(
                "expected integer, got {other:?}"
            ))),
        }
    }

    pub fn as_i64(&self) -> Result<i64, AdapterError> {
        match canonicalize(&self.object, &self.inspector)? {
            Canonical::Long(v) => Ok(v),
            other => Err(AdapterError::KeyConversion(format!(
                "expected long, got {other:?}"
            ))),
        }
    }

    pub fn as_bool(&self) -> Result<bool, AdapterError> {
        match canonicalize(&self.object, &self.inspector)? {
            Canonical::Boolean(v) => Ok(v),
            other => Err(AdapterError::KeyConversion(format!(
                "expected boolean, got {other:?}"
            ))),
        }
    }

    pub fn as_str(&self) -> Result<&str, AdapterError> {
        match &self.object {
            BoxedObject::Text(s) | BoxedObject::Lazy(s) => Ok(s),
            other => Err(AdapterError::KeyConversion(format!(
                "expected string, got {other:?}"
            ))),
        }
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        canonicalize(&self.object, &self.inspector)
    }
}

/// A native map plus the key/value inspectors established at construction.
/// Lookup first converts the probe key to the native key representation;
/// when native encodings disagree it falls back to comparing both sides in
/// standard form.
#[derive(Clone, Debug)]
pub struct BoxedMap {
    entries: Vec<(BoxedObject, BoxedObject)>,
    key_inspector: Inspector,
    value_inspector: Inspector,
    key_type: DataType,
    value_type: DataType,
    settable: bool,
}

impl BoxedMap {
    pub(crate) fn new(
        object: BoxedObject,
        key_inspector: Inspector,
        value_inspector: Inspector,
        settable: bool,
    ) -> Result<Self, AdapterError> {
        let entries = match object {
            BoxedObject::Map(entries) => entries,
            other => {
                return Err(AdapterError::UnsupportedShape(format!(
                    "expected native map, got {other:?}"
                )));
            }
        };
        let key_type = data_type(&key_inspector)?
            .ok_or_else(|| AdapterError::UnsupportedShape("void map key".to_string()))?;
        let value_type = data_type(&value_inspector)?
            .ok_or_else(|| AdapterError::UnsupportedShape("void map value".to_string()))?;
        Ok(Self {
            entries,
            key_inspector,
            value_inspector,
            key_type,
            value_type,
            settable,
        })
    }

    pub(crate) fn empty(
        key_inspector: Inspector,
        value_inspector: Inspector,
        settable: bool,
    ) -> Result<Self, AdapterError> {
        Self::new(
            BoxedObject::Map(Vec::new()),
            key_inspector,
            value_inspector,
            settable,
        )
    }

    pub fn data_type(&self) -> DataType {
        DataType::map(self.key_type.clone(), self.value_type.clone())
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &Datum) -> Result<Option<Datum>, AdapterError> {
        match self.lookup(key)? {
            Some(idx) => wrap(self.entries[idx].1.clone(), &self.value_inspector),
            None => Ok(None),
        }
    }

    pub fn contains_key(&self, key: &Datum) -> Result<bool, AdapterError> {
        Ok(self.lookup(key)?.is_some())
    }

    pub fn put(&mut self, key: &Datum, value: &Datum) -> Result<(), AdapterError> {
        if !self.settable {
            return Err(AdapterError::Mutation(format!(
                "boxed map of type {} is not settable",
                self.data_type()
            )));
        }
        let key_obj = to_native(key, &self.key_inspector)?;
        let value_obj = to_native(value, &self.value_inspector)?;
        match self.entries.iter().position(|(k, _)| *k == key_obj) {
            Some(idx) => self.entries[idx].1 = value_obj,
            None => self.entries.push((key_obj, value_obj)),
        }
        Ok(())
    }

    pub fn keys(&self) -> impl Iterator<Item = Element> + '_ {
        self.entries
            .iter()
            .map(|(k, _)| wrap(k.clone(), &self.key_inspector))
    }

    pub fn values(&self) -> impl Iterator<Item = Element> + '_ {
        self.entries
            .iter()
            .map(|(_, v)| wrap(v.clone(), &self.value_inspector))
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        canonicalize(&self.to_object(), &self.inspector())
    }

    pub fn to_object(&self) -> BoxedObject {
        BoxedObject::Map(self.entries.clone())
    }

    fn inspector(&self) -> Inspector {
        Inspector::Map {
            key: Box::new(self.key_inspector.clone()),
            value: Box::new(self.value_inspector.clone()),
            settable: self.settable,
        }
    }

    /// Index of the entry holding `key`, trying the native key encoding
    /// first and the canonical form when conversion fails.
    fn lookup(&self, key: &Datum) -> Result<Option<usize>, AdapterError> {
        if let Some((object, inspector)) = native_of(key) {
            match convert_for(object, inspector, &self.key_inspector) {
                Ok(native) => {
                    return Ok(self.entries.iter().position(|(k, _)| *k == native));
                }
                Err(err) => {
                    tracing::debug!(
                        "key conversion to native encoding failed ({err}), retrying in standard form"
                    );
                }
            }
        }
        let probe = key.to_canonical()?;
        for (idx, (k, _)) in self.entries.iter().enumerate() {
            if canonicalize(k, &self.key_inspector)? == probe {
                return Ok(Some(idx));
            }
        }
        Ok(None)
    }
}

/// A native list; all elements share the inspector fixed at construction.
#[derive(Clone, Debug)]
pub struct BoxedArray {
    elements: Vec<BoxedObject>,
    element_inspector: Inspector,
    element_type: DataType,
    settable: bool,
}

impl BoxedArray {
    pub(crate) fn new(
        object: BoxedObject,
        element_inspector: Inspector,
        settable: bool,
    ) -> Result<Self, AdapterError> {
        let elements = match object {
            BoxedObject::List(elements) => elements,
            other => {
                return Err(AdapterError::UnsupportedShape(format!(
                    "expected native list, got {other:?}"
                )));
            }
        };
        let element_type = data_type(&element_inspector)?
            .ok_or_else(|| AdapterError::UnsupportedShape("void list element".to_string()))?;
        Ok(Self {
            elements,
            element_inspector,
            element_type,
            settable,
        })
    }

    pub fn data_type(&self) -> DataType {
        DataType::array(self.element_type.clone())
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn get(&self, index: usize) -> Result<Option<Datum>, AdapterError> {
        match self.elements.get(index) {
            Some(element) => wrap(element.clone(), &self.element_inspector),
            None => Ok(None),
        }
    }

    pub fn append(&mut self, element: &Datum) -> Result<(), AdapterError> {
        if !self.settable {
            return Err(AdapterError::Mutation(format!(
                "boxed array of type {} is not settable",
                self.data_type()
            )));
        }
        let native = to_native(element, &self.element_inspector)?;
        self.elements.push(native);
        Ok(())
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.elements
            .iter()
            .map(|e| wrap(e.clone(), &self.element_inspector))
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        let inspector = Inspector::List {
            element: Box::new(self.element_inspector.clone()),
            settable: self.settable,
        };
        canonicalize(&self.to_object(), &inspector)
    }

    pub fn to_object(&self) -> BoxedObject {
        BoxedObject::List(self.elements.clone())
    }
}

/// A native struct with positional fields fixed at construction.
#[derive(Clone, Debug)]
pub struct BoxedStruct {
    values: Vec<BoxedObject>,
    fields: Vec<(String, Inspector)>,
    field_types: Vec<StructField>,
    settable: bool,
}

impl BoxedStruct {
    pub(crate) fn new(
        object: BoxedObject,
        fields: Vec<(String, Inspector)>,
        settable: bool,
    ) -> Result<Self, AdapterError> {
        let values = match object {
            BoxedObject::Struct(values) => values,
            other => {
                return Err(AdapterError::UnsupportedShape(format!(
                    "expected native struct, got {other:?}"
                )));
            }
        };
        if values.len() != fields.len() {
            return Err(AdapterError::UnsupportedShape(format!(
                "struct arity mismatch: {} fields, {} values",
                fields.len(),
                values.len()
            )));
        }
        let mut field_types = Vec::with_capacity(fields.len());
        for (name, inspector) in &fields {
            let field = data_type(inspector)?.ok_or_else(|| {
                AdapterError::UnsupportedShape(format!("void struct field {name}"))
            })?;
            field_types.push(StructField::new(name.clone(), field));
        }
        Ok(Self {
            values,
            fields,
            field_types,
            settable,
        })
    }

    pub fn data_type(&self) -> DataType {
        DataType::Struct(self.field_types.clone())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn field(&self, index: usize) -> Result<Option<Datum>, AdapterError> {
        match self.values.get(index) {
            Some(value) => wrap(value.clone(), &self.fields[index].1),
            None => Ok(None),
        }
    }

    pub fn field_by_name(&self, name: &str) -> Result<Option<Datum>, AdapterError> {
        match self.fields.iter().position(|(n, _)| n == name) {
            Some(idx) => self.field(idx),
            None => Ok(None),
        }
    }

    pub fn set_field(&mut self, index: usize, value: &Datum) -> Result<(), AdapterError> {
        if !self.settable {
            return Err(AdapterError::Mutation(format!(
                "boxed struct of type {} is not settable",
                self.data_type()
            )));
        }
        if index >= self.values.len() {
            return Err(AdapterError::Mutation(format!(
                "struct field index {index} out of range for {} fields",
                self.values.len()
            )));
        }
        self.values[index] = to_native(value, &self.fields[index].1)?;
        Ok(())
    }

    pub fn to_canonical(&self) -> Result<Canonical, AdapterError> {
        let inspector = Inspector::Struct {
            fields: self.fields.clone(),
            settable: self.settable,
        };
        canonicalize(&self.to_object(), &inspector)
    }

    pub fn to_object(&self) -> BoxedObject {
        BoxedObject::Struct(self.values.clone())
    }
}

/// Standard (settable, plain-encoded) inspector for a portable shape; what
/// the factory hands out for containers built inside a UDF body.
pub fn standard_inspector(data_type: &DataType) -> Inspector {
    match data_type {
        DataType::Integer => Inspector::Integer(Encoding::Standard),
        DataType::Long => Inspector::Long(Encoding::Standard),
        DataType::Boolean => Inspector::Boolean(Encoding::Standard),
        DataType::String => Inspector::String(Encoding::Standard),
        DataType::Array(element) => Inspector::List {
            element: Box::new(standard_inspector(element)),
            settable: true,
        },
        DataType::Map(key, value) => Inspector::Map {
            key: Box::new(standard_inspector(key)),
            value: Box::new(standard_inspector(value)),
            settable: true,
        },
        DataType::Struct(fields) => Inspector::Struct {
            fields: fields
                .iter()
                .map(|f| (f.name.clone(), standard_inspector(&f.data_type)))
                .collect(),
            settable: true,
        },
    }
}

/// Factory for the boxed backend: fresh values carry standard inspectors.
#[derive(Debug, Default)]
pub struct BoxedFactory;

impl DatumFactory for BoxedFactory {
    fn new_integer(&self, value: i32) -> Datum {
        Datum::Integer(IntegerDatum::Boxed(BoxedPrimitive::new(
            BoxedObject::Int(value),
            Inspector::Integer(Encoding::Standard),
        )))
    }

    fn new_long(&self, value: i64) -> Datum {
        Datum::Long(LongDatum::Boxed(BoxedPrimitive::new(
            BoxedObject::Long(value),
            Inspector::Long(Encoding::Standard),
        )))
    }

    fn new_boolean(&self, value: bool) -> Datum {
        Datum::Boolean(BooleanDatum::Boxed(BoxedPrimitive::new(
            BoxedObject::Bool(value),
            Inspector::Boolean(Encoding::Standard),
        )))
    }

    fn new_string(&self, value: &str) -> Datum {
        Datum::String(StringDatum::Boxed(BoxedPrimitive::new(
            BoxedObject::Text(value.to_string()),
            Inspector::String(Encoding::Standard),
        )))
    }

    fn new_array(&self, element_type: &DataType) -> Result<Datum, AdapterError> {
        let array = BoxedArray::new(
            BoxedObject::List(Vec::new()),
            standard_inspector(element_type),
            true,
        )?;
        Ok(Datum::Array(ArrayDatum::Boxed(array)))
    }

    fn new_map(&self, key_type: &DataType, value_type: &DataType) -> Result<Datum, AdapterError> {
        let map = BoxedMap::empty(
            standard_inspector(key_type),
            standard_inspector(value_type),
            true,
        )?;
        Ok(Datum::Map(MapDatum::Boxed(map)))
    }

    fn new_struct(&self, fields: &[StructField]) -> Result<Datum, AdapterError> {
        let row = BoxedStruct::new(
            BoxedObject::Struct(vec![BoxedObject::Null; fields.len()]),
            fields
                .iter()
                .map(|f| (f.name.clone(), standard_inspector(&f.data_type)))
                .collect(),
            true,
        )?;
        Ok(Datum::Struct(StructDatum::Boxed(row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_text_map(settable: bool) -> BoxedMap {
        // Keys held in the lazy text encoding, as a row serde would keep them.
        BoxedMap::new(
            BoxedObject::Map(vec![
                (BoxedObject::Lazy("1".into()), BoxedObject::Text("a".into())),
                (BoxedObject::Lazy("2".into()), BoxedObject::Text("b".into())),
            ]),
            Inspector::Integer(Encoding::Text),
            Inspector::String(Encoding::Standard),
            settable,
        )
        .expect("map")
    }

    fn int_key(value: i32) -> Datum {
        BoxedFactory.new_integer(value)
    }

    #[test]
    fn get_reencodes_probe_key_to_native_encoding() {
        let map = int_text_map(false);
        let got = map.get(&int_key(1)).expect("get").expect("present");
        match got {
            Datum::String(s) => assert_eq!(s.value().unwrap(), "a"),
            other => panic!("unexpected datum: {other:?}"),
        }
        assert!(map.get(&int_key(3)).expect("get").is_none());
    }

    #[test]
    fn get_falls_back_to_canonical_form_for_unparseable_native_keys() {
        // A malformed lazy key cannot be compared natively against a
        // re-encoded probe that happens to equal it, but lookups for other
        // keys must still succeed through the canonical path.
        let map = BoxedMap::new(
            BoxedObject::Map(vec![(
                BoxedObject::Int(7),
                BoxedObject::Text("seven".into()),
            )]),
            Inspector::Integer(Encoding::Standard),
            Inspector::String(Encoding::Standard),
            false,
        )
        .expect("map");
        // Probe key carries a text encoding the container does not use.
        let probe = Datum::Integer(IntegerDatum::Boxed(BoxedPrimitive::new(
            BoxedObject::Lazy("7".into()),
            Inspector::Integer(Encoding::Text),
        )));
        let got = map.get(&probe).expect("get").expect("present");
        match got {
            Datum::String(s) => assert_eq!(s.value().unwrap(), "seven"),
            other => panic!("unexpected datum: {other:?}"),
        }
    }

    #[test]
    fn put_on_non_settable_map_fails_and_leaves_contents_unchanged() {
        let mut map = int_text_map(false);
        let err = map
            .put(&int_key(3), &BoxedFactory.new_string("c"))
            .expect_err("expected mutation error");
        assert!(matches!(err, AdapterError::Mutation(_)), "err={err}");
        assert_eq!(map.size(), 2);
        assert!(map.get(&int_key(3)).expect("get").is_none());
    }

    #[test]
    fn put_replaces_existing_key_and_appends_new_key() {
        let mut map = int_text_map(true);
        map.put(&int_key(2), &BoxedFactory.new_string("bb"))
            .expect("replace");
        assert_eq!(map.size(), 2);
        map.put(&int_key(3), &BoxedFactory.new_string("c"))
            .expect("append");
        assert_eq!(map.size(), 3);
        assert!(map.contains_key(&int_key(3)).expect("contains"));
        // The replacement key was stored in the container's native text
        // encoding, not the probe's standard encoding.
        match map.get(&int_key(2)).expect("get").expect("present") {
            Datum::String(s) => assert_eq!(s.value().unwrap(), "bb"),
            other => panic!("unexpected datum: {other:?}"),
        }
    }

    #[test]
    fn key_iteration_wraps_with_construction_time_inspectors() {
        let map = int_text_map(false);
        let keys: Vec<i32> = map
            .keys()
            .map(|k| match k.expect("key").expect("non-null") {
                Datum::Integer(i) => i.value().expect("decode"),
                other => panic!("unexpected key: {other:?}"),
            })
            .collect();
        assert_eq!(keys, vec![1, 2]);
    }

    #[test]
    fn wrap_rejects_unsupported_inspectors() {
        let err = wrap(BoxedObject::Long(1), &Inspector::Timestamp).expect_err("unsupported");
        assert!(matches!(err, AdapterError::UnsupportedShape(_)), "err={err}");
    }

    #[test]
    fn wrap_void_and_null_yield_absent() {
        assert!(wrap(BoxedObject::Null, &Inspector::Void).expect("void").is_none());
        assert!(
            wrap(BoxedObject::Null, &Inspector::Integer(Encoding::Standard))
                .expect("null int")
                .is_none()
        );
    }

    #[test]
    fn array_append_respects_settable_flag() {
        let mut array = BoxedArray::new(
            BoxedObject::List(vec![BoxedObject::Int(1)]),
            Inspector::Integer(Encoding::Standard),
            false,
        )
        .expect("array");
        let err = array.append(&int_key(2)).expect_err("immutable");
        assert!(matches!(err, AdapterError::Mutation(_)));
        assert_eq!(array.size(), 1);
    }

    #[test]
    fn struct_fields_are_positional_and_named() {
        let row = BoxedStruct::new(
            BoxedObject::Struct(vec![BoxedObject::Int(5), BoxedObject::Text("x".into())]),
            vec![
                ("id".to_string(), Inspector::Integer(Encoding::Standard)),
                ("name".to_string(), Inspector::String(Encoding::Standard)),
            ],
            false,
        )
        .expect("struct");
        match row.field(0).expect("field").expect("non-null") {
            Datum::Integer(i) => assert_eq!(i.value().unwrap(), 5),
            other => panic!("unexpected field: {other:?}"),
        }
        match row.field_by_name("name").expect("field").expect("non-null") {
            Datum::String(s) => assert_eq!(s.value().unwrap(), "x"),
            other => panic!("unexpected field: {other:?}"),
        }
        assert!(row.field_by_name("missing").expect("lookup").is_none());
    }
}
