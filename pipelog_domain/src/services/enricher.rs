// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Enricher Contract
//!
//! Enrichers add fields to an event before redaction. They run first in the
//! pipeline and their contributions are merged into the envelope's `data`
//! mapping with last-writer-wins on key conflict (list order decides the
//! winner).
//!
//! Failures are contained: an `Err` from one enricher is reported through
//! diagnostics, its contribution is dropped, and the remaining enrichers
//! still run.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::entities::LogEnvelope;
use crate::error::LogError;

/// Adds fields to events ahead of redaction.
#[async_trait]
pub trait Enricher: Send + Sync {
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

    /// Produces the fields to merge into the event's `data` mapping. The
    /// enricher must not assume exclusive access to the envelope; it reads,
    /// the runner merges.
    async fn enrich(&self, event: &LogEnvelope) -> Result<Map<String, Value>, LogError>;
}
