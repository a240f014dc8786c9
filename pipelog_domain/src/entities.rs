// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain entities: the log envelope and its builder, the hash-chained
//! audit event, the compliance policy, and the drain summaries.

pub mod audit_event;
pub mod compliance_policy;
pub mod drain_result;
pub mod log_envelope;

pub use audit_event::{AuditEvent, AuditEventType, ChainVerificationResult, GENESIS_HASH};
pub use compliance_policy::{ComplianceLevel, CompliancePolicy};
pub use drain_result::{AdaptiveSnapshot, DrainResult};
pub use log_envelope::{
    build_envelope, CapturedError, Diagnostics, EnvelopeSeed, ExceptionSettings, LogEnvelope, Origin,
};
