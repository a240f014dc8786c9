// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sink Contract
//!
//! Terminal components that deliver serialized envelopes outside the
//! process (stdout, files, HTTP endpoints, audit stores).
//!
//! ## Implementation Requirements
//!
//! - Thread-safe (`Send + Sync`); a sink may be written to by several
//!   workers concurrently.
//! - `write` failures are reported as `Err`, never panics: the worker's
//!   circuit breaker counts consecutive failures and routes traffic to the
//!   fallback sink while open.
//! - `stop` must be idempotent and flush any sink-internal buffering.
//!
//! Sinks receive the serialized byte view, not the envelope: by the time a
//! write happens, enrichment, redaction, and filtering are complete, and
//! the bytes are the contract.

use async_trait::async_trait;

use crate::error::LogError;
use crate::value_objects::SerializedView;

/// Terminal delivery component for serialized log events.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Stable sink name used in diagnostics and breaker state.
    fn name(&self) -> &str;

    /// Called once before the first write.
    async fn start(&self) -> Result<(), LogError> {
        Ok(())
    }

    /// Called once at drain; idempotent.
    async fn stop(&self) -> Result<(), LogError> {
        Ok(())
    }

    /// Liveness probe used by supervision and half-open breaker checks.
    async fn health_check(&self) -> bool {
        true
    }

    /// Delivers one serialized envelope.
    async fn write(&self, view: &SerializedView) -> Result<(), LogError>;

    /// Delivers a batch; the default loops over [`Sink::write`] and stops
    /// at the first failure so the breaker sees an accurate failure count.
    async fn write_batch(&self, views: &[SerializedView]) -> Result<(), LogError> {
        for view in views {
            self.write(view).await?;
        }
        Ok(())
    }
}
