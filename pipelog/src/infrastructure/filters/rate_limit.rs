// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Fixed-window rate limiter: at most `max_per_window` events pass per
//! window; the counter resets when the window rolls over. Coarse by
//! design; the goal is protecting sinks from floods, not fair queueing.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::services::Filter;

/// Configuration for the fixed-window limiter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    pub max_per_window: u64,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_window: 1000,
            window: Duration::from_secs(1),
        }
    }
}

struct WindowState {
    window_start: Instant,
    count: u64,
}

/// Fixed-window event rate limiter.
pub struct RateLimitFilter {
    config: RateLimitConfig,
    state: Mutex<WindowState>,
}

impl RateLimitFilter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(WindowState {
                window_start: Instant::now(),
                count: 0,
            }),
        }
    }

    fn admit(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        if now.duration_since(state.window_start) >= self.config.window {
            state.window_start = now;
            state.count = 0;
        }
        if state.count < self.config.max_per_window {
            state.count += 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl Filter for RateLimitFilter {
    fn name(&self) -> &str {
        "rate_limit"
    }

    async fn filter(&self, event: LogEnvelope) -> Option<LogEnvelope> {
        if self.admit(Instant::now()) {
            Some(event)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_limit() {
        let filter = RateLimitFilter::new(RateLimitConfig {
            max_per_window: 3,
            window: Duration::from_secs(60),
        });
        let now = Instant::now();
        assert!(filter.admit(now));
        assert!(filter.admit(now));
        assert!(filter.admit(now));
        assert!(!filter.admit(now));
    }

    #[test]
    fn test_window_rollover_resets_count() {
        let filter = RateLimitFilter::new(RateLimitConfig {
            max_per_window: 1,
            window: Duration::from_millis(10),
        });
        let start = Instant::now();
        assert!(filter.admit(start));
        assert!(!filter.admit(start));
        assert!(filter.admit(start + Duration::from_millis(11)));
    }
}
