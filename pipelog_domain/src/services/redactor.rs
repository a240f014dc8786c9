// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Redactor Contract
//!
//! Redactors remove or mask sensitive material. They run sequentially,
//! each receiving an owned copy of the event and returning the transformed
//! event; the runner keeps the last committed snapshot so a redactor that
//! fails mid-transformation can never corrupt what earlier redactors
//! produced.
//!
//! The pipeline is fail-open for redactors by default (a failing redactor
//! passes the pre-redaction snapshot through); fail-close mode inverts
//! this and drops the event instead.

use async_trait::async_trait;

use crate::entities::LogEnvelope;
use crate::error::LogError;

/// Masks or strips sensitive material from events.
#[async_trait]
pub trait Redactor: Send + Sync {
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

    /// Transforms an owned copy of the event. Implementations must return
    /// either the fully transformed event or `Err`; partially transformed
    /// events must never escape (the runner discards the copy on error).
    async fn redact(&self, event: LogEnvelope) -> Result<LogEnvelope, LogError>;
}
