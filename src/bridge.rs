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

//! Backend dispatch: the single seam where an engine value plus its type
//! descriptor becomes a portable datum, and where a portable datum is
//! handed back to the engine. Both directions are closed matches over the
//! two backends, so an unrecognized shape is a loud error, never a silent
//! null.

use std::sync::Arc;

use crate::block::{self, Block, BlockBuilder, BlockFactory, EngineType, OperatorRegistry};
use crate::boxed::{self, BoxedFactory, BoxedObject, Inspector};
use crate::common::error::AdapterError;
use crate::data::{
    ArrayDatum, BooleanDatum, DataType, Datum, DatumFactory, IntegerDatum, LongDatum, MapDatum,
    StringDatum, StructDatum,
};

/// A value as the engine holds it: a boxed object, or one position of a
/// columnar block.
#[derive(Clone, Debug)]
pub enum NativeValue {
    Boxed(BoxedObject),
    Block { block: Block, position: usize },
}

/// The engine-side type of a native value.
#[derive(Clone, Debug)]
pub enum NativeDescriptor {
    Inspector(Inspector),
    Engine(EngineType),
}

/// Portable shape for a descriptor: `None` for the void shapes, error for
/// shapes the portable layer does not support.
pub fn data_type(descriptor: &NativeDescriptor) -> Result<Option<DataType>, AdapterError> {
    match descriptor {
        NativeDescriptor::Inspector(inspector) => boxed::data_type(inspector),
        NativeDescriptor::Engine(engine) => block::data_type(engine),
    }
}

/// Wrap an engine value into a portable datum. The value and descriptor
/// must come from the same backend.
pub fn wrap(
    value: NativeValue,
    descriptor: &NativeDescriptor,
    ops: &Arc<dyn OperatorRegistry>,
) -> Result<Option<Datum>, AdapterError> {
    match (value, descriptor) {
        (NativeValue::Boxed(object), NativeDescriptor::Inspector(inspector)) => {
            boxed::wrap(object, inspector)
        }
        (NativeValue::Block { block, position }, NativeDescriptor::Engine(engine)) => {
            block::wrap(&block, position, engine, ops)
        }
        (value, descriptor) => Err(AdapterError::UnsupportedShape(format!(
            "value {value:?} does not belong to the backend of {descriptor:?}"
        ))),
    }
}

fn is_block_backed(datum: &Datum) -> bool {
    matches!(
        datum,
        Datum::Integer(IntegerDatum::Block(_))
            | Datum::Long(LongDatum::Block(_))
            | Datum::Boolean(BooleanDatum::Block(_))
            | Datum::String(StringDatum::Block(_))
            | Datum::Array(ArrayDatum::Block(_))
            | Datum::Map(MapDatum::Block(_))
            | Datum::Struct(StructDatum::Block(_))
    )
}

/// Hand a datum back to the engine in the backend it was built for: the
/// live boxed object, or a one-position block holding the slot encoding.
pub fn unwrap(datum: &Datum) -> Result<NativeValue, AdapterError> {
    if is_block_backed(datum) {
        let mut builder = BlockBuilder::new();
        block::write_datum(&mut builder, Some(datum), &datum.data_type())?;
        Ok(NativeValue::Block {
            block: builder.build(),
            position: 0,
        })
    } else {
        Ok(NativeValue::Boxed(boxed::native_object(datum)?))
    }
}

/// Factory matching a descriptor's backend, for building values a UDF
/// returns into the same representation its arguments arrived in.
pub fn factory_for(
    descriptor: &NativeDescriptor,
    ops: &Arc<dyn OperatorRegistry>,
) -> Box<dyn DatumFactory> {
    match descriptor {
        NativeDescriptor::Inspector(_) => Box::new(BoxedFactory),
        NativeDescriptor::Engine(_) => Box::new(BlockFactory::new(ops.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::NativeOperators;
    use crate::boxed::Encoding;

    fn registry() -> Arc<dyn OperatorRegistry> {
        Arc::new(NativeOperators)
    }

    #[test]
    fn backend_mismatch_is_rejected() {
        let err = wrap(
            NativeValue::Boxed(BoxedObject::Int(1)),
            &NativeDescriptor::Engine(EngineType::Int32),
            &registry(),
        )
        .expect_err("mismatch");
        assert!(matches!(err, AdapterError::UnsupportedShape(_)), "err={err}");
    }

    #[test]
    fn boxed_value_round_trips_through_wrap_and_unwrap() {
        let descriptor =
            NativeDescriptor::Inspector(Inspector::String(Encoding::Standard));
        let datum = wrap(
            NativeValue::Boxed(BoxedObject::Text("hi".into())),
            &descriptor,
            &registry(),
        )
        .expect("wrap")
        .expect("non-null");
        match unwrap(&datum).expect("unwrap") {
            NativeValue::Boxed(BoxedObject::Text(s)) => assert_eq!(s, "hi"),
            other => panic!("unexpected native value: {other:?}"),
        }
    }

    #[test]
    fn block_value_unwraps_to_single_position_block() {
        let ops = registry();
        let mut builder = BlockBuilder::new();
        builder.append_slot(&7i32.to_le_bytes());
        let datum = wrap(
            NativeValue::Block {
                block: builder.build(),
                position: 0,
            },
            &NativeDescriptor::Engine(EngineType::Int32),
            &ops,
        )
        .expect("wrap")
        .expect("non-null");
        match unwrap(&datum).expect("unwrap") {
            NativeValue::Block { block, position } => {
                assert_eq!(position, 0);
                assert_eq!(block.position_count(), 1);
                assert_eq!(block.slot(0).unwrap(), Some(&7i32.to_le_bytes()[..]));
            }
            other => panic!("unexpected native value: {other:?}"),
        }
    }

    #[test]
    fn factory_backend_follows_descriptor() {
        let ops = registry();
        let boxed_factory = factory_for(
            &NativeDescriptor::Inspector(Inspector::Integer(Encoding::Standard)),
            &ops,
        );
        assert!(!is_block_backed(&boxed_factory.new_integer(1)));
        let block_factory = factory_for(&NativeDescriptor::Engine(EngineType::Int32), &ops);
        assert!(is_block_backed(&block_factory.new_integer(1)));
    }
}
