// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filter Contract
//!
//! Filters decide whether an event continues to the sinks. The drop
//! decision is an explicit `None`: there is no sentinel value inside the
//! event and no exception-based control flow.
//!
//! A filter that cannot evaluate its predicate should fail open and return
//! the event; dropping traffic because a filter's internal state is broken
//! would turn a filter bug into data loss.

use async_trait::async_trait;

use crate::entities::LogEnvelope;
use crate::error::LogError;

/// Pass/drop decision point ahead of serialization.
#[async_trait]
pub trait Filter: Send + Sync {
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

    /// Returns `Some(event)` to continue, `None` to drop.
    async fn filter(&self, event: LogEnvelope) -> Option<LogEnvelope>;
}
