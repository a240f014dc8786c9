// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Service
//!
//! Prometheus registry for the pipeline's operational metrics, namespaced
//! under `pipelog`:
//!
//! - `events_submitted_total`, `events_processed_total`,
//!   `events_dropped_total`, `sink_errors_total`: counters.
//! - `pressure_level`: integer gauge (0 normal .. 3 critical).
//! - `queue_depth_main`, `queue_depth_protected`: lane depth gauges
//!   sampled by the pressure monitor.
//! - `worker_count`: live worker gauge.
//! - `flush_duration_seconds`: per-batch flush latency histogram.
//!
//! The registry is owned, not global: every logger instance carries its
//! own, and `gather()` renders the current state for an exporter.

use std::sync::Arc;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};
use tracing::debug;

use pipelog_domain::LogError;

const NAMESPACE: &str = "pipelog";

/// Prometheus metrics for one logger instance.
#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,
    pub events_submitted_total: IntCounter,
    pub events_processed_total: IntCounter,
    pub events_dropped_total: IntCounter,
    pub sink_errors_total: IntCounter,
    pub pressure_level: IntGauge,
    pub queue_depth_main: IntGauge,
    pub queue_depth_protected: IntGauge,
    pub worker_count: IntGauge,
    pub flush_duration_seconds: Histogram,
}

impl MetricsService {
    pub fn new() -> Result<Self, LogError> {
        let registry = Registry::new();

        let events_submitted_total = IntCounter::with_opts(
            Opts::new("events_submitted_total", "Total events accepted for enqueue").namespace(NAMESPACE),
        )
        .map_err(|e| LogError::metrics_error(format!("Failed to create events_submitted_total metric: {}", e)))?;

        let events_processed_total = IntCounter::with_opts(
            Opts::new("events_processed_total", "Total events fully handled by the pipeline").namespace(NAMESPACE),
        )
        .map_err(|e| LogError::metrics_error(format!("Failed to create events_processed_total metric: {}", e)))?;

        let events_dropped_total = IntCounter::with_opts(
            Opts::new("events_dropped_total", "Total events lost to backpressure or pipeline errors")
                .namespace(NAMESPACE),
        )
        .map_err(|e| LogError::metrics_error(format!("Failed to create events_dropped_total metric: {}", e)))?;

        let sink_errors_total = IntCounter::with_opts(
            Opts::new("sink_errors_total", "Total primary sink write failures").namespace(NAMESPACE),
        )
        .map_err(|e| LogError::metrics_error(format!("Failed to create sink_errors_total metric: {}", e)))?;

        let pressure_level = IntGauge::with_opts(
            Opts::new("pressure_level", "Current pressure level (0 normal .. 3 critical)").namespace(NAMESPACE),
        )
        .map_err(|e| LogError::metrics_error(format!("Failed to create pressure_level metric: {}", e)))?;

        let queue_depth_main = IntGauge::with_opts(
            Opts::new("queue_depth_main", "Current main-lane queue depth").namespace(NAMESPACE),
        )
        .map_err(|e| LogError::metrics_error(format!("Failed to create queue_depth_main metric: {}", e)))?;

        let queue_depth_protected = IntGauge::with_opts(
            Opts::new("queue_depth_protected", "Current protected-lane queue depth").namespace(NAMESPACE),
        )
        .map_err(|e| LogError::metrics_error(format!("Failed to create queue_depth_protected metric: {}", e)))?;

        let worker_count = IntGauge::with_opts(
            Opts::new("worker_count", "Current number of live workers").namespace(NAMESPACE),
        )
        .map_err(|e| LogError::metrics_error(format!("Failed to create worker_count metric: {}", e)))?;

        let flush_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("flush_duration_seconds", "Per-batch flush latency in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.3, 1.0, 5.0]),
        )
        .map_err(|e| LogError::metrics_error(format!("Failed to create flush_duration_seconds metric: {}", e)))?;

        registry
            .register(Box::new(events_submitted_total.clone()))
            .map_err(|e| LogError::metrics_error(format!("Failed to register events_submitted_total: {}", e)))?;
        registry
            .register(Box::new(events_processed_total.clone()))
            .map_err(|e| LogError::metrics_error(format!("Failed to register events_processed_total: {}", e)))?;
        registry
            .register(Box::new(events_dropped_total.clone()))
            .map_err(|e| LogError::metrics_error(format!("Failed to register events_dropped_total: {}", e)))?;
        registry
            .register(Box::new(sink_errors_total.clone()))
            .map_err(|e| LogError::metrics_error(format!("Failed to register sink_errors_total: {}", e)))?;
        registry
            .register(Box::new(pressure_level.clone()))
            .map_err(|e| LogError::metrics_error(format!("Failed to register pressure_level: {}", e)))?;
        registry
            .register(Box::new(queue_depth_main.clone()))
            .map_err(|e| LogError::metrics_error(format!("Failed to register queue_depth_main: {}", e)))?;
        registry
            .register(Box::new(queue_depth_protected.clone()))
            .map_err(|e| LogError::metrics_error(format!("Failed to register queue_depth_protected: {}", e)))?;
        registry
            .register(Box::new(worker_count.clone()))
            .map_err(|e| LogError::metrics_error(format!("Failed to register worker_count: {}", e)))?;
        registry
            .register(Box::new(flush_duration_seconds.clone()))
            .map_err(|e| LogError::metrics_error(format!("Failed to register flush_duration_seconds: {}", e)))?;

        debug!("MetricsService initialized with Prometheus registry");

        Ok(Self {
            registry: Arc::new(registry),
            events_submitted_total,
            events_processed_total,
            events_dropped_total,
            sink_errors_total,
            pressure_level,
            queue_depth_main,
            queue_depth_protected,
            worker_count,
            flush_duration_seconds,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn gather(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
