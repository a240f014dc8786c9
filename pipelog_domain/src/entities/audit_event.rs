// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Audit Event Entity
//!
//! This module provides the hash-chained, append-only audit record and the
//! pure chain-verification routine.
//!
//! ## Chain Construction
//!
//! Every event carries:
//!
//! - `sequence_number`: strictly increasing from 1 within a trail.
//! - `previous_hash`: the checksum of the preceding event; the first event
//!   links to the all-zeros [`GENESIS_HASH`].
//! - `checksum`: SHA-256 over a canonical serialization of the event's own
//!   fields (sequence number, event type, timestamp, message, metadata with
//!   sorted keys, previous hash).
//!
//! The linkage invariant, `event[N+1].previous_hash == event[N].checksum`,
//! makes any retroactive edit detectable: changing any covered field of
//! event *i* breaks verification at or before index *i*.
//!
//! ## Verification
//!
//! [`verify_chain`] is pure: it checks per-event checksums, sequence
//! contiguity from 1, and linkage, and reports the result as a value.
//! Integrity failures are never raised as errors.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Previous-hash value of the first event in a chain (64 zero hex chars).
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Category of an audit event. Serializes as its snake_case string;
/// unknown strings deserialize as [`AuditEventType::Custom`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEventType {
    SystemStartup,
    SystemShutdown,
    DataAccess,
    DataModification,
    DataDeletion,
    AuthSuccess,
    AuthFailure,
    ConfigChange,
    SecurityEvent,
    Custom(String),
}

impl AuditEventType {
    pub fn as_str(&self) -> &str {
        match self {
            AuditEventType::SystemStartup => "system_startup",
            AuditEventType::SystemShutdown => "system_shutdown",
            AuditEventType::DataAccess => "data_access",
            AuditEventType::DataModification => "data_modification",
            AuditEventType::DataDeletion => "data_deletion",
            AuditEventType::AuthSuccess => "auth_success",
            AuditEventType::AuthFailure => "auth_failure",
            AuditEventType::ConfigChange => "config_change",
            AuditEventType::SecurityEvent => "security_event",
            AuditEventType::Custom(name) => name,
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for AuditEventType {
    fn from(value: &str) -> Self {
        match value {
            "system_startup" => AuditEventType::SystemStartup,
            "system_shutdown" => AuditEventType::SystemShutdown,
            "data_access" => AuditEventType::DataAccess,
            "data_modification" => AuditEventType::DataModification,
            "data_deletion" => AuditEventType::DataDeletion,
            "auth_success" => AuditEventType::AuthSuccess,
            "auth_failure" => AuditEventType::AuthFailure,
            "config_change" => AuditEventType::ConfigChange,
            "security_event" => AuditEventType::SecurityEvent,
            other => AuditEventType::Custom(other.to_string()),
        }
    }
}

impl Serialize for AuditEventType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuditEventType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AuditEventType::from(raw.as_str()))
    }
}

/// One append-only audit record.
///
/// Optional attribution and classification fields are omitted from the
/// JSON-lines form when unset; they are not covered by the checksum, which
/// protects the core fields listed in the module docs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub sequence_number: u64,
    pub event_type: AuditEventType,
    /// RFC3339 UTC.
    pub timestamp: String,
    pub message: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contains_pii: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contains_phi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data_classification: Option<String>,
    /// Checksum of the preceding event; [`GENESIS_HASH`] for the first.
    pub previous_hash: String,
    /// SHA-256 over this event's canonical serialization, hex encoded.
    pub checksum: String,
}

impl AuditEvent {
    /// Creates an unlinked event with the current timestamp. Sequence
    /// number, previous hash, and checksum are assigned by the trail.
    pub fn new(event_type: AuditEventType, message: impl Into<String>) -> Self {
        Self {
            sequence_number: 0,
            event_type,
            timestamp: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            message: message.into(),
            metadata: Map::new(),
            user_id: None,
            session_id: None,
            request_id: None,
            contains_pii: None,
            contains_phi: None,
            data_classification: None,
            previous_hash: GENESIS_HASH.to_string(),
            checksum: String::new(),
        }
    }

    /// Computes the SHA-256 checksum over the canonical serialization.
    ///
    /// Canonical form: a compact JSON object with fields in fixed order and
    /// metadata keys sorted, so the digest is stable regardless of the
    /// insertion order the producer used.
    pub fn compute_checksum(&self) -> String {
        let sorted_metadata: BTreeMap<&String, &Value> = self.metadata.iter().collect();
        let canonical = serde_json::json!({
            "sequence_number": self.sequence_number,
            "event_type": self.event_type.as_str(),
            "timestamp": self.timestamp,
            "message": self.message,
            "metadata": sorted_metadata,
            "previous_hash": self.previous_hash,
        });
        let encoded = serde_json::to_vec(&canonical).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        hex::encode(hasher.finalize())
    }

    /// Checks the stored checksum against the recomputed one.
    pub fn verify_checksum(&self) -> bool {
        self.checksum == self.compute_checksum()
    }
}

/// Outcome of a chain verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerificationResult {
    pub valid: bool,
    pub events_checked: usize,
    pub error_message: Option<String>,
}

impl ChainVerificationResult {
    pub fn ok(events_checked: usize) -> Self {
        Self {
            valid: true,
            events_checked,
            error_message: None,
        }
    }

    pub fn broken(events_checked: usize, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            events_checked,
            error_message: Some(message.into()),
        }
    }
}

/// Verifies an event sequence: per-event checksums, contiguous sequence
/// numbers starting at 1, and previous-hash linkage.
///
/// Pure; an empty slice is a valid (zero-length) chain.
pub fn verify_chain(events: &[AuditEvent]) -> ChainVerificationResult {
    let mut expected_prev = GENESIS_HASH.to_string();
    for (index, event) in events.iter().enumerate() {
        let expected_seq = (index + 1) as u64;
        if event.sequence_number != expected_seq {
            return ChainVerificationResult::broken(
                index,
                format!(
                    "sequence gap at index {}: expected {}, found {}",
                    index, expected_seq, event.sequence_number
                ),
            );
        }
        if event.previous_hash != expected_prev {
            return ChainVerificationResult::broken(
                index,
                format!("previous_hash mismatch at sequence {}", event.sequence_number),
            );
        }
        if !event.verify_checksum() {
            return ChainVerificationResult::broken(
                index,
                format!("checksum mismatch at sequence {}", event.sequence_number),
            );
        }
        expected_prev = event.checksum.clone();
    }
    ChainVerificationResult::ok(events.len())
}
