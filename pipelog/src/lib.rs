// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib checked separately from tests - tests may use unwrap/expect)

//! # Pipelog
//!
//! A high-throughput asynchronous structured-logging pipeline for server
//! applications. Producers on any thread hand events to a non-blocking
//! dual-priority queue; worker tasks enrich, redact, filter, serialize,
//! and deliver them to sinks with bounded memory, bounded latency, and
//! resilience to pressure and downstream failure.
//!
//! ## Architecture Overview
//!
//! The workspace follows Clean Architecture layering:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  (Logger facade, builder, drain orchestration)              │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer (pipelog-domain)            │
//! │  (Envelope, audit chain, levels, plugin contracts, errors)  │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                         │
//! │  (Dual queue, workers, pressure control, serialization,     │
//! │   redactors/filters/enrichers, sinks, audit storage,        │
//! │   metrics, settings)                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Concepts
//!
//! ### Dual-priority queue
//! High-severity events ride a protected lane that survives pressure;
//! under protected-lane saturation the queue sheds main-lane traffic
//! until the protected backlog clears.
//!
//! ### Adaptive pressure control
//! A monitor task samples queue fill and walks a hysteresis ladder
//! (`normal → elevated → high → critical`). Transitions drive actuators:
//! filter tightening, worker scaling, and grow-only queue capacity.
//!
//! ### Tamper-evident audit trail
//! A specialized sink chains events with SHA-256 checksums so any
//! retroactive edit is detectable, persisted as JSON lines with
//! compliance-policy validation.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pipelog::{LoggerBuilder, Settings};
//!
//! # async fn demo() -> Result<(), pipelog::LogError> {
//! let logger = LoggerBuilder::new(Settings::default()).build()?;
//! logger.bind("request_id", serde_json::json!("req-1"));
//! logger.info("request accepted");
//! let result = logger.stop_and_drain(std::time::Duration::from_secs(5)).await;
//! assert_eq!(result.submitted, result.processed + result.dropped);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! # Run all tests
//! cargo test
//!
//! # Generate documentation
//! cargo doc --open
//! ```

pub mod application;
pub mod infrastructure;

// Public API surface.
pub use application::{Logger, LoggerBuilder};
pub use infrastructure::audit::{AuditStorage, AuditTrail, AuditTrailRegistry, AuditTrailStats};
pub use infrastructure::concurrency::{DualQueue, Lane};
pub use infrastructure::config::{
    AdaptiveSettings, BackpressureMode, CoreSettings, RedactionSettings, Settings, SinkGuardSettings,
};
pub use infrastructure::enrichers::RuntimeInfoEnricher;
pub use infrastructure::filters::{
    FirstOccurrenceConfig, FirstOccurrenceFilter, LevelGateFilter, RateLimitConfig, RateLimitFilter,
    SamplingFilter, TraceSamplingConfig, TraceSamplingFilter,
};
pub use infrastructure::metrics::MetricsService;
pub use infrastructure::pipeline::{PipelineRunner, UNSAFE_MARKER};
pub use infrastructure::processors::PassthroughProcessor;
pub use infrastructure::redactors::{
    FieldMaskConfig, FieldMaskRedactor, PatternMaskConfig, PatternMaskRedactor, PiiPattern,
    StringTruncateConfig, StringTruncateRedactor, UrlCredentialsConfig, UrlCredentialsRedactor,
};
pub use infrastructure::pressure::{ActuatorCounters, ActuatorSet, FilterLadder, PressureMonitor};
pub use infrastructure::runtime::{ResourcePool, WorkerPool};
pub use infrastructure::serialization::{frame_json_line, serialize_envelope, SCHEMA_VERSION};
pub use infrastructure::sinks::{
    AuditSink, CircuitBreaker, FallbackRedactMode, FallbackSink, GuardedSink, RotatingFileSink,
    StderrFallbackSink, StdoutSink,
};

// Domain re-exports so most applications depend on one crate.
pub use pipelog_domain::entities::{
    build_envelope, AdaptiveSnapshot, AuditEvent, AuditEventType, CapturedError, ChainVerificationResult,
    ComplianceLevel, CompliancePolicy, Diagnostics, DrainResult, EnvelopeSeed, ExceptionSettings, LogEnvelope,
    Origin, GENESIS_HASH,
};
pub use pipelog_domain::services::{Enricher, Filter, Processor, Redactor, Sink};
pub use pipelog_domain::{Level, LogError, PressureLevel, SerializedView};
