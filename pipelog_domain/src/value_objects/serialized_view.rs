// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Serialized View Value Object
//!
//! An owned, cheaply cloneable byte buffer carrying the JSON encoding of
//! one envelope inside the versioned schema wrapper. The buffer is created
//! once by the serializer and then handed by reference through processors
//! and to sinks; cloning shares the underlying allocation.

use std::fmt;
use std::sync::Arc;

/// Immutable byte view of one serialized envelope.
#[derive(Clone, PartialEq, Eq)]
pub struct SerializedView {
    data: Arc<Vec<u8>>,
}

impl SerializedView {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data: Arc::new(data) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lossy UTF-8 rendering, used by fallback paths that must emit
    /// something even for corrupt payloads.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

impl fmt::Debug for SerializedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializedView").field("len", &self.data.len()).finish()
    }
}

impl From<Vec<u8>> for SerializedView {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}
