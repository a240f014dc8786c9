// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Processor Contract
//!
//! Processors operate on the serialized byte view after redaction and
//! before sink delivery. An identity-preserving processor returns its input
//! view unchanged, which costs one reference-count bump and no copy.

use async_trait::async_trait;

use crate::error::LogError;
use crate::value_objects::SerializedView;

/// Transforms serialized envelopes between redaction and delivery.
#[async_trait]
pub trait Processor: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&self) -> Result<(), LogError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), LogError> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    /// Transforms the serialized view. Return the input view unchanged for
    /// a zero-copy pass-through.
    async fn process(&self, view: SerializedView) -> Result<SerializedView, LogError>;
}
