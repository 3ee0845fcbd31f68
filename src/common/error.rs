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

/// Errors surfaced by the adapter layer.
///
/// `KeyConversion` is recoverable inside the boxed backend (the canonical-form
/// fallback handles it); every other kind propagates to the caller unmodified.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("unsupported native shape: {0}")]
    UnsupportedShape(String),

    #[error("attempt to modify an immutable container: {0}")]
    Mutation(String),

    #[error("cannot convert value to the container's native representation: {0}")]
    KeyConversion(String),

    #[error("equality operator for key type {key_type}: {message}")]
    OperatorResolution { key_type: String, message: String },

    #[error("malformed block: {0}")]
    MalformedBlock(String),
}
