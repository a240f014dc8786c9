// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipelog Domain
//!
//! Domain layer for the pipelog asynchronous structured-logging pipeline.
//! This crate holds everything that is true about a log event regardless of
//! how it is queued, scheduled, or delivered:
//!
//! - **Entities**: the [`LogEnvelope`] event record and its builder, the
//!   hash-chained [`AuditEvent`], the [`CompliancePolicy`], and the
//!   [`DrainResult`] / [`AdaptiveSnapshot`] shutdown summaries.
//! - **Value objects**: the totally ordered [`Level`] and [`PressureLevel`].
//! - **Service contracts**: the async plugin traits ([`Sink`], [`Enricher`],
//!   [`Redactor`], [`Processor`], [`Filter`]) that the infrastructure layer
//!   and external plugins implement.
//! - **Errors**: the [`LogError`] enum shared by every layer.
//!
//! ## Architecture
//!
//! The domain layer has no knowledge of queues, workers, or sinks' I/O; it
//! defines *what* the pipeline moves and the contracts at its seams. Async
//! execution, locking, and persistence live in the `pipelog` crate.
//!
//! Plugin traits are async because every category is allowed to await I/O
//! (sinks always do; enrichers and redactors may consult caches). CPU-bound
//! implementations simply return ready futures.
//!
//! [`LogEnvelope`]: entities::LogEnvelope
//! [`AuditEvent`]: entities::AuditEvent
//! [`CompliancePolicy`]: entities::CompliancePolicy
//! [`DrainResult`]: entities::DrainResult
//! [`AdaptiveSnapshot`]: entities::AdaptiveSnapshot
//! [`Level`]: value_objects::Level
//! [`PressureLevel`]: value_objects::PressureLevel
//! [`Sink`]: services::Sink
//! [`Enricher`]: services::Enricher
//! [`Redactor`]: services::Redactor
//! [`Processor`]: services::Processor
//! [`Filter`]: services::Filter
//! [`LogError`]: error::LogError

pub mod entities;
pub mod error;
pub mod events;
pub mod services;
pub mod value_objects;

pub use error::LogError;
pub use value_objects::{Level, PressureLevel, SerializedView};
