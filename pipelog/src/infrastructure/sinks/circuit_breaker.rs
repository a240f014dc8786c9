// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sink Circuit Breaker
//!
//! Per-sink failure containment: `Closed → Open → HalfOpen → Closed`.
//!
//! - **Closed**: writes go to the primary; consecutive failures are
//!   counted, successes reset the count.
//! - **Open**: entered after `failure_threshold` consecutive failures;
//!   writes route to the fallback sink without touching the primary.
//! - **HalfOpen**: after the cooldown one probe write is allowed through;
//!   success closes the breaker, failure re-opens it (and restarts the
//!   cooldown). Writes arriving while the probe is outstanding use the
//!   fallback.
//!
//! State lives behind one light mutex; the decision section is a few
//! loads and stores, the actual sink I/O happens outside the lock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use prometheus::IntCounter;
use tracing::{debug, warn};

use pipelog_domain::services::Sink;
use pipelog_domain::{LogError, SerializedView};

use crate::infrastructure::config::SinkGuardSettings;
use crate::infrastructure::sinks::fallback::{write_serialized_to_stderr, FallbackRedactMode};

/// Breaker position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Consecutive-failure circuit breaker.
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<BreakerInner>,
}

/// Routing decision for one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Primary,
    Fallback,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    /// Decides where the next write goes, transitioning Open → HalfOpen
    /// when the cooldown has elapsed.
    pub fn route(&self) -> Route {
        self.route_at(Instant::now())
    }

    fn route_at(&self, now: Instant) -> Route {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => Route::Primary,
            BreakerState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map(|at| now.duration_since(at) >= self.cooldown)
                    .unwrap_or(true);
                if cooled_down {
                    inner.state = BreakerState::HalfOpen;
                    inner.probe_in_flight = true;
                    debug!("circuit breaker half-open; allowing one probe");
                    Route::Primary
                } else {
                    Route::Fallback
                }
            }
            BreakerState::HalfOpen => {
                if inner.probe_in_flight {
                    Route::Fallback
                } else {
                    inner.probe_in_flight = true;
                    Route::Primary
                }
            }
        }
    }

    /// Records a successful primary write.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != BreakerState::Closed {
            debug!("circuit breaker closed after successful probe");
        }
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.probe_in_flight = false;
    }

    /// Records a failed primary write; opens the breaker at the threshold
    /// and re-opens immediately on a failed probe.
    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now())
    }

    fn record_failure_at(&self, now: Instant) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.opened_at = Some(now);
                inner.probe_in_flight = false;
                warn!("circuit breaker probe failed; re-opened");
            }
            _ => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold && inner.state == BreakerState::Closed {
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(now);
                    warn!(
                        failures = inner.consecutive_failures,
                        "circuit breaker opened"
                    );
                }
            }
        }
    }
}

/// A primary sink guarded by a breaker, with traffic routed to a fallback
/// sink while open. Write failures never propagate to the worker; the
/// fallback chain ends at stderr.
pub struct GuardedSink {
    primary: Arc<dyn Sink>,
    fallback: Arc<dyn Sink>,
    breaker: CircuitBreaker,
    enabled: bool,
    stderr_redact: FallbackRedactMode,
    error_counter: Option<IntCounter>,
}

impl GuardedSink {
    pub fn new(primary: Arc<dyn Sink>, fallback: Arc<dyn Sink>, settings: &SinkGuardSettings) -> Self {
        Self {
            primary,
            fallback,
            breaker: CircuitBreaker::new(
                settings.failure_threshold,
                Duration::from_secs_f64(settings.cooldown_seconds),
            ),
            enabled: settings.enabled,
            stderr_redact: if settings.fallback_redact_minimal {
                FallbackRedactMode::Minimal
            } else {
                FallbackRedactMode::None
            },
            error_counter: None,
        }
    }

    /// Attaches the primary-failure counter. The guard contains write
    /// errors, so this is how they stay visible to operators.
    pub fn with_error_counter(mut self, counter: IntCounter) -> Self {
        self.error_counter = Some(counter);
        self
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    async fn write_fallback(&self, view: &SerializedView) {
        if let Err(error) = self.fallback.write(view).await {
            warn!(
                sink = self.fallback.name(),
                error = %error,
                fallback = "stderr",
                "fallback sink failed; writing to stderr"
            );
            write_serialized_to_stderr(view, self.stderr_redact);
        }
    }
}

#[async_trait]
impl Sink for GuardedSink {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn start(&self) -> Result<(), LogError> {
        self.primary.start().await
    }

    async fn stop(&self) -> Result<(), LogError> {
        self.primary.stop().await
    }

    async fn health_check(&self) -> bool {
        self.primary.health_check().await
    }

    async fn write(&self, view: &SerializedView) -> Result<(), LogError> {
        if !self.enabled {
            return self.primary.write(view).await;
        }
        match self.breaker.route() {
            Route::Fallback => {
                self.write_fallback(view).await;
                Ok(())
            }
            Route::Primary => match self.primary.write(view).await {
                Ok(()) => {
                    self.breaker.record_success();
                    Ok(())
                }
                Err(error) => {
                    self.breaker.record_failure();
                    if let Some(counter) = &self.error_counter {
                        counter.inc();
                    }
                    warn!(
                        sink = self.primary.name(),
                        error = %error,
                        fallback = self.fallback.name(),
                        "primary sink write failed"
                    );
                    self.write_fallback(view).await;
                    Ok(())
                }
            },
        }
    }
}
