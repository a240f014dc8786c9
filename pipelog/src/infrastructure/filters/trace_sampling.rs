// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Trace-Aware Sampling Filter
//!
//! Samples deterministically by trace id so a trace is either fully kept
//! or fully dropped: the decision is a threshold comparison on a hash of
//! the trace id, and therefore identical for every event carrying it.
//! Events without a trace id fall back to uniform random sampling, and
//! configured levels (default: Error and Critical) always pass.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::services::Filter;
use pipelog_domain::Level;

/// Configuration for trace-aware sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSamplingConfig {
    pub sample_rate: f64,
    /// `data` key consulted when the envelope's `trace_id` field is unset.
    pub trace_id_field: String,
    pub always_pass_levels: Vec<Level>,
}

impl Default for TraceSamplingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 0.1,
            trace_id_field: "trace_id".to_string(),
            always_pass_levels: vec![Level::Error, Level::Critical],
        }
    }
}

/// Deterministic per-trace sampler.
pub struct TraceSamplingFilter {
    rate: f64,
    trace_id_field: String,
    always_pass_levels: Vec<Level>,
}

impl TraceSamplingFilter {
    pub fn new(config: TraceSamplingConfig) -> Self {
        Self {
            rate: config.sample_rate.clamp(0.0, 1.0),
            trace_id_field: config.trace_id_field,
            always_pass_levels: config.always_pass_levels,
        }
    }

    pub fn current_sample_rate(&self) -> f64 {
        self.rate
    }

    /// Stable pass/drop decision for one trace id: the first 16 bytes of
    /// SHA-256(trace_id) interpreted as a big-endian u128, compared
    /// against `rate × 2^128`.
    fn trace_passes(&self, trace_id: &str) -> bool {
        let digest = Sha256::digest(trace_id.as_bytes());
        let mut prefix = [0u8; 16];
        prefix.copy_from_slice(&digest[..16]);
        let hash_value = u128::from_be_bytes(prefix);
        let threshold = (self.rate * (u128::MAX as f64)) as u128;
        hash_value < threshold
    }

    fn trace_id_of(&self, event: &LogEnvelope) -> Option<String> {
        if let Some(trace_id) = &event.trace_id {
            return Some(trace_id.clone());
        }
        event
            .data
            .get(&self.trace_id_field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

#[async_trait]
impl Filter for TraceSamplingFilter {
    fn name(&self) -> &str {
        "trace_sampling"
    }

    async fn filter(&self, event: LogEnvelope) -> Option<LogEnvelope> {
        if self.always_pass_levels.contains(&event.level) {
            return Some(event);
        }
        match self.trace_id_of(&event) {
            Some(trace_id) => {
                if self.trace_passes(&trace_id) {
                    Some(event)
                } else {
                    None
                }
            }
            None => {
                if rand::random::<f64>() < self.rate {
                    Some(event)
                } else {
                    None
                }
            }
        }
    }
}
