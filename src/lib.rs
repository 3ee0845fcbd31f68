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

//! Portable UDF data adapter: one value facade over two engine-native
//! representations, a boxed-object backend and a columnar block backend,
//! so the same function body runs unchanged on either engine.

pub mod block;
pub mod boxed;
pub mod bridge;
pub mod common;
pub mod data;
pub mod udf;

pub use bridge::{NativeDescriptor, NativeValue, factory_for, unwrap, wrap};
pub use common::error::AdapterError;
pub use data::{
    ArrayDatum, BooleanDatum, Canonical, DataType, Datum, DatumFactory, Element, IntegerDatum,
    LongDatum, MapDatum, StringDatum, StructDatum, StructField,
};
pub use udf::{LATEST_TOKEN, ScalarUdf, localize_required_files};
