// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Audit Trail
//!
//! Compliance-grade, hash-chained event log. The trail owns the chain
//! state (next sequence number, last checksum) behind one async mutex, so
//! concurrent `log_event` callers serialize at linkage time and every
//! event gets a unique, contiguous sequence number.
//!
//! ## Failure Containment
//!
//! A failed storage write must not poison the trail: the event is still
//! linked into the chain and counted, a diagnostic is emitted, and
//! subsequent events are accepted. Statistics remain available throughout.
//!
//! ## Policy Validation
//!
//! `start()` validates the attached compliance policy and reports
//! shortfalls as warnings, never errors. A disabled policy skips
//! validation. `encrypt_audit_logs` draws a dedicated warning because
//! at-rest encryption is not implemented.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{info, warn};

use pipelog_domain::entities::{
    audit_event, AuditEvent, AuditEventType, ChainVerificationResult, CompliancePolicy, GENESIS_HASH,
};
use pipelog_domain::LogError;

use super::storage::AuditStorage;

/// Point-in-time trail statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditTrailStats {
    pub name: String,
    pub total_events: u64,
    pub persist_failures: u64,
    pub policy_summary: String,
}

struct ChainState {
    next_sequence: u64,
    last_hash: String,
}

/// Hash-chained append-only audit log with optional JSONL persistence.
pub struct AuditTrail {
    name: String,
    policy: CompliancePolicy,
    storage: Option<AuditStorage>,
    chain: Mutex<ChainState>,
    total_events: AtomicU64,
    persist_failures: AtomicU64,
    started: AtomicBool,
}

impl AuditTrail {
    /// In-memory trail (no persistence); `verify_chain_from_storage`
    /// reports an empty chain.
    pub fn new(name: impl Into<String>, policy: CompliancePolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            storage: None,
            chain: Mutex::new(ChainState {
                next_sequence: 1,
                last_hash: GENESIS_HASH.to_string(),
            }),
            total_events: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
            started: AtomicBool::new(false),
        }
    }

    /// Trail persisting to `audit_<name>_<date>.jsonl` files under
    /// `storage_dir`.
    pub fn with_storage(
        name: impl Into<String>,
        policy: CompliancePolicy,
        storage_dir: impl Into<std::path::PathBuf>,
    ) -> Self {
        let name = name.into();
        let storage = AuditStorage::new(storage_dir, name.clone());
        Self {
            storage: Some(storage),
            ..Self::new(name, policy)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validates the policy (warnings only) and marks the trail started.
    /// Idempotent.
    pub async fn start(&self) -> Result<(), LogError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        for warning in self.policy.validation_warnings() {
            warn!(trail = %self.name, "compliance policy: {}", warning);
        }
        if self.policy.encrypt_audit_logs {
            warn!(
                trail = %self.name,
                "encrypt_audit_logs is set but audit log encryption is not implemented; events are stored in plaintext"
            );
        }
        info!(trail = %self.name, policy = %self.policy.summary(), "audit trail started");
        Ok(())
    }

    /// Idempotent stop; storage writes are awaited per-event, so there is
    /// nothing left to flush.
    pub async fn stop(&self) -> Result<(), LogError> {
        self.started.store(false, Ordering::Release);
        Ok(())
    }

    /// Links and persists one event. Returns the fully linked event.
    pub async fn log_event(&self, event_type: AuditEventType, message: impl Into<String>) -> AuditEvent {
        self.log_event_with(event_type, message, Map::new()).await
    }

    /// Links and persists one event carrying metadata.
    pub async fn log_event_with(
        &self,
        event_type: AuditEventType,
        message: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> AuditEvent {
        let mut event = AuditEvent::new(event_type, message);
        event.metadata = metadata;

        {
            let mut chain = self.chain.lock().await;
            event.sequence_number = chain.next_sequence;
            event.previous_hash = chain.last_hash.clone();
            event.checksum = event.compute_checksum();
            chain.next_sequence += 1;
            chain.last_hash = event.checksum.clone();
        }
        self.total_events.fetch_add(1, Ordering::Relaxed);

        if let Some(storage) = &self.storage {
            if let Err(error) = storage.append(&event).await {
                // A write failure never poisons the trail; the chain state
                // already advanced and later events are still accepted.
                self.persist_failures.fetch_add(1, Ordering::Relaxed);
                warn!(trail = %self.name, error = %error, "audit event persistence failed");
            }
        }
        event
    }

    /// Pure chain verification over an in-memory slice.
    pub fn verify_chain(events: &[AuditEvent]) -> ChainVerificationResult {
        audit_event::verify_chain(events)
    }

    /// Loads every persisted event and verifies the chain.
    pub async fn verify_chain_from_storage(&self) -> ChainVerificationResult {
        let storage = match &self.storage {
            Some(storage) => storage,
            None => return ChainVerificationResult::ok(0),
        };
        match storage.load_all().await {
            Ok(events) => Self::verify_chain(&events),
            Err(error) => ChainVerificationResult::broken(0, format!("storage read failed: {}", error)),
        }
    }

    pub fn stats(&self) -> AuditTrailStats {
        AuditTrailStats {
            name: self.name.clone(),
            total_events: self.total_events.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            policy_summary: self.policy.summary(),
        }
    }
}
