// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Probabilistic sampling filter: each event passes independently with the
//! configured probability. Rate 1.0 passes everything, 0.0 drops
//! everything.

use async_trait::async_trait;

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::services::Filter;

/// Uniform random sampler.
pub struct SamplingFilter {
    rate: f64,
}

impl SamplingFilter {
    /// `rate` is clamped into `[0.0, 1.0]`.
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

#[async_trait]
impl Filter for SamplingFilter {
    fn name(&self) -> &str {
        "sampling"
    }

    async fn filter(&self, event: LogEnvelope) -> Option<LogEnvelope> {
        if rand::random::<f64>() < self.rate {
            Some(event)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipelog_domain::entities::{build_envelope, EnvelopeSeed, ExceptionSettings};

    fn event() -> LogEnvelope {
        build_envelope(
            EnvelopeSeed {
                message: "m".into(),
                ..Default::default()
            },
            &ExceptionSettings::default(),
        )
    }

    #[test]
    fn test_rate_clamped() {
        assert_eq!(SamplingFilter::new(1.7).rate(), 1.0);
        assert_eq!(SamplingFilter::new(-0.2).rate(), 0.0);
    }

    #[tokio::test]
    async fn test_rate_one_passes_everything() {
        let filter = SamplingFilter::new(1.0);
        for _ in 0..50 {
            assert!(filter.filter(event()).await.is_some());
        }
    }

    #[tokio::test]
    async fn test_rate_zero_drops_everything() {
        let filter = SamplingFilter::new(0.0);
        for _ in 0..50 {
            assert!(filter.filter(event()).await.is_none());
        }
    }
}
