// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Sink implementations and the resilience wrappers around them.

pub mod audit;
pub mod circuit_breaker;
pub mod fallback;
pub mod file;
pub mod stdout;

pub use audit::AuditSink;
pub use circuit_breaker::{BreakerState, CircuitBreaker, GuardedSink};
pub use fallback::{FallbackRedactMode, FallbackSink, StderrFallbackSink};
pub use file::RotatingFileSink;
pub use stdout::StdoutSink;
