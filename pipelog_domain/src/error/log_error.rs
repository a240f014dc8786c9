// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Log Pipeline Errors
//!
//! This module defines the single error enum used across the logging
//! pipeline. Each variant represents one failure mode with a descriptive
//! message.
//!
//! ## Propagation Policy
//!
//! Only configuration errors are allowed to reach the caller, and only at
//! construction time. Every other class is contained at the stage that
//! produced it:
//!
//! - Pipeline stage failures are reported through diagnostics and the event
//!   proceeds with the failing stage's contribution dropped (or rolled back,
//!   for redactors).
//! - Sink failures feed the circuit breaker; they never propagate to the
//!   producer.
//! - Audit chain mismatches are reported through `ChainVerificationResult`,
//!   never raised.
//! - Backpressure conditions (queue full, pool acquire timeout) are returned
//!   as values and counted, not thrown across the producer boundary.

use thiserror::Error;

/// Domain-specific errors for the logging pipeline.
///
/// Variants carry a descriptive message rather than structured payloads;
/// the stage that contains an error is responsible for recording any
/// structured context (via `tracing` fields) before converting it.
#[derive(Error, Debug, Clone)]
pub enum LogError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Enrichment failed: {0}")]
    EnrichmentFailed(String),

    #[error("Redaction failed: {0}")]
    RedactionFailed(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Filter failed: {0}")]
    FilterFailed(String),

    #[error("Sink error: {0}")]
    SinkError(String),

    #[error("Queue full: {0}")]
    QueueFull(String),

    #[error("Backpressure: {0}")]
    Backpressure(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Integrity check failed: {0}")]
    IntegrityError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Shutdown in progress: {0}")]
    ShuttingDown(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),
}

impl LogError {
    /// Creates a new configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a new redaction error
    pub fn redaction_failed(msg: impl Into<String>) -> Self {
        Self::RedactionFailed(msg.into())
    }

    /// Creates a new processing error
    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    /// Creates a new sink error
    pub fn sink_error(msg: impl Into<String>) -> Self {
        Self::SinkError(msg.into())
    }

    /// Creates a new backpressure error
    pub fn backpressure(msg: impl Into<String>) -> Self {
        Self::Backpressure(msg.into())
    }

    /// Creates a new resource exhausted error
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// Creates a new integrity error
    pub fn integrity_error(msg: impl Into<String>) -> Self {
        Self::IntegrityError(msg.into())
    }

    /// Creates a new IO error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Creates a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::TimeoutError(msg.into())
    }

    /// Creates a new cancellation error
    pub fn cancelled() -> Self {
        Self::Cancelled("task cancelled".to_string())
    }

    /// Creates a new internal error
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Creates a new metrics error
    pub fn metrics_error(msg: impl Into<String>) -> Self {
        Self::MetricsError(msg.into())
    }

    /// Checks if the error is recoverable (retry-able by the caller)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LogError::TimeoutError(_)
                | LogError::ResourceExhausted(_)
                | LogError::Backpressure(_)
                | LogError::QueueFull(_)
                | LogError::IoError(_)
        )
    }

    /// Checks if the error is a backpressure-class error
    pub fn is_backpressure(&self) -> bool {
        matches!(
            self,
            LogError::Backpressure(_) | LogError::QueueFull(_) | LogError::ResourceExhausted(_)
        )
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            LogError::InvalidConfiguration(_) => "configuration",
            LogError::EnrichmentFailed(_) => "enrichment",
            LogError::RedactionFailed(_) => "redaction",
            LogError::ProcessingFailed(_) => "processing",
            LogError::FilterFailed(_) => "filter",
            LogError::SinkError(_) => "sink",
            LogError::QueueFull(_) => "backpressure",
            LogError::Backpressure(_) => "backpressure",
            LogError::ResourceExhausted(_) => "resource",
            LogError::IntegrityError(_) => "integrity",
            LogError::SerializationError(_) => "serialization",
            LogError::IoError(_) => "io",
            LogError::TimeoutError(_) => "timeout",
            LogError::Cancelled(_) => "cancellation",
            LogError::ShuttingDown(_) => "shutdown",
            LogError::InternalError(_) => "internal",
            LogError::MetricsError(_) => "metrics",
        }
    }
}

// Implement conversion from standard library errors
impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        LogError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        LogError::SerializationError(err.to_string())
    }
}
