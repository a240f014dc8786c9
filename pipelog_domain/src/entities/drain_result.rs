// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Drain Summaries
//!
//! Immutable result structs returned by `stop_and_drain`: the pipeline
//! counters plus, when adaptive mode ran, a snapshot of the pressure
//! controller's lifetime activity.

use std::collections::HashMap;

use crate::value_objects::PressureLevel;

/// Lifetime summary of the adaptive pressure controller, produced at drain
/// time by the monitor's `snapshot()`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveSnapshot {
    pub peak_pressure_level: PressureLevel,
    pub escalation_count: u64,
    pub deescalation_count: u64,
    /// Seconds accumulated while at each level; the level current at
    /// snapshot time is finalized into this map.
    pub time_at_level: HashMap<PressureLevel, f64>,
    pub filters_swapped: u64,
    pub workers_scaled: u64,
    pub peak_workers: usize,
    pub batch_resize_count: u64,
}

impl AdaptiveSnapshot {
    /// A snapshot for a controller that never left `Normal`.
    pub fn quiet() -> Self {
        Self {
            peak_pressure_level: PressureLevel::Normal,
            escalation_count: 0,
            deescalation_count: 0,
            time_at_level: PressureLevel::ALL.iter().map(|l| (*l, 0.0)).collect(),
            filters_swapped: 0,
            workers_scaled: 0,
            peak_workers: 1,
            batch_resize_count: 0,
        }
    }
}

/// Final accounting returned by `stop_and_drain`.
///
/// `submitted == processed + dropped` holds for every clean drain; events
/// suppressed before enqueue (level gate, duplicate suppression) are not
/// counted as submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct DrainResult {
    pub submitted: u64,
    pub processed: u64,
    pub dropped: u64,
    pub retried: u64,
    pub queue_depth_high_watermark: usize,
    pub flush_latency_seconds: f64,
    /// Present only when the adaptive controller was enabled.
    pub adaptive: Option<AdaptiveSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_snapshot_covers_all_levels() {
        let snapshot = AdaptiveSnapshot::quiet();
        assert_eq!(snapshot.time_at_level.len(), PressureLevel::ALL.len());
        assert_eq!(snapshot.peak_pressure_level, PressureLevel::Normal);
    }

    #[test]
    fn test_drain_result_adaptive_optional() {
        let result = DrainResult {
            submitted: 10,
            processed: 9,
            dropped: 1,
            retried: 0,
            queue_depth_high_watermark: 5,
            flush_latency_seconds: 0.1,
            adaptive: None,
        };
        assert!(result.adaptive.is_none());
        assert_eq!(result.submitted, result.processed + result.dropped);
    }

    #[test]
    fn test_drain_result_carries_snapshot() {
        let snapshot = AdaptiveSnapshot {
            peak_pressure_level: PressureLevel::High,
            escalation_count: 3,
            deescalation_count: 2,
            time_at_level: PressureLevel::ALL.iter().map(|l| (*l, 1.0)).collect(),
            filters_swapped: 3,
            workers_scaled: 2,
            peak_workers: 6,
            batch_resize_count: 8,
        };
        let result = DrainResult {
            submitted: 5,
            processed: 5,
            dropped: 0,
            retried: 0,
            queue_depth_high_watermark: 3,
            flush_latency_seconds: 0.05,
            adaptive: Some(snapshot.clone()),
        };
        assert_eq!(result.adaptive.unwrap().peak_pressure_level, PressureLevel::High);
    }
}
