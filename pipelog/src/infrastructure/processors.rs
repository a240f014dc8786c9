// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Built-in Processors
//!
//! Processors transform the serialized byte view between redaction and
//! delivery. The passthrough exists as the identity element of the stage
//! and as the reference for the zero-copy contract: returning the input
//! view shares the allocation instead of copying it.

use async_trait::async_trait;

use pipelog_domain::services::Processor;
use pipelog_domain::{LogError, SerializedView};

/// Identity processor; returns its input view unchanged.
pub struct PassthroughProcessor;

impl PassthroughProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PassthroughProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Processor for PassthroughProcessor {
    fn name(&self) -> &str {
        "passthrough"
    }

    async fn process(&self, view: SerializedView) -> Result<SerializedView, LogError> {
        Ok(view)
    }
}
