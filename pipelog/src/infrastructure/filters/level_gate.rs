// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Severity gate: passes events at or above a minimum severity. The
//! facade applies its own numeric gate before enqueue; this filter exists
//! for the pressure ladder, where tightening means raising the floor
//! mid-flight.

use async_trait::async_trait;

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::services::Filter;
use pipelog_domain::Level;

/// Drops events below the configured severity.
pub struct LevelGateFilter {
    minimum: Level,
}

impl LevelGateFilter {
    pub fn new(minimum: Level) -> Self {
        Self { minimum }
    }

    pub fn minimum(&self) -> Level {
        self.minimum
    }
}

#[async_trait]
impl Filter for LevelGateFilter {
    fn name(&self) -> &str {
        "level_gate"
    }

    async fn filter(&self, event: LogEnvelope) -> Option<LogEnvelope> {
        if event.level >= self.minimum {
            Some(event)
        } else {
            None
        }
    }
}
