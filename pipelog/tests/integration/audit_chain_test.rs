// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Audit trail end-to-end: chained persistence, verification, and tamper
//! detection.

use pipelog::{AuditEvent, AuditEventType, AuditTrail, AuditTrailRegistry, CompliancePolicy};

#[tokio::test]
async fn ten_events_persist_and_verify() {
    let dir = tempfile::tempdir().unwrap();
    let trail = AuditTrail::with_storage("orders", CompliancePolicy::sox(), dir.path());
    trail.start().await.unwrap();

    for i in 0..10 {
        trail
            .log_event(AuditEventType::DataAccess, format!("operation {}", i))
            .await;
    }

    // Ten JSON lines on disk.
    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(files.len(), 1);
    let content = std::fs::read_to_string(files[0].path()).unwrap();
    assert_eq!(content.lines().count(), 10);

    let result = trail.verify_chain_from_storage().await;
    assert!(result.valid);
    assert_eq!(result.events_checked, 10);
    assert!(result.error_message.is_none());
}

#[tokio::test]
async fn tampered_message_invalidates_chain() {
    let dir = tempfile::tempdir().unwrap();
    let trail = AuditTrail::with_storage("orders", CompliancePolicy::sox(), dir.path());
    trail.start().await.unwrap();
    for i in 0..10 {
        trail.log_event(AuditEventType::DataAccess, format!("operation {}", i)).await;
    }

    // Tamper with event 5's message on disk.
    let file = std::fs::read_dir(dir.path())
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    let content = std::fs::read_to_string(&file).unwrap();
    let edited: Vec<String> = content
        .lines()
        .map(|line| {
            let mut event: AuditEvent = serde_json::from_str(line).unwrap();
            if event.sequence_number == 5 {
                event.message = "forged".to_string();
            }
            serde_json::to_string(&event).unwrap()
        })
        .collect();
    std::fs::write(&file, edited.join("\n") + "\n").unwrap();

    let result = trail.verify_chain_from_storage().await;
    assert!(!result.valid);
    assert!(result.error_message.unwrap().contains("sequence 5"));
}

#[tokio::test]
async fn altered_previous_hash_invalidates_chain() {
    let trail = AuditTrail::new("t", CompliancePolicy::default());
    let mut events = Vec::new();
    for i in 0..5 {
        events.push(trail.log_event(AuditEventType::DataAccess, format!("e{}", i)).await);
    }
    events[3].previous_hash = "f".repeat(64);
    let result = AuditTrail::verify_chain(&events);
    assert!(!result.valid);
}

#[tokio::test]
async fn registry_round_trip_and_reset() {
    let dir = tempfile::tempdir().unwrap();
    let registry = AuditTrailRegistry::new();

    let trail = registry
        .get_or_create("payments", CompliancePolicy::gdpr(), Some(dir.path().to_path_buf()))
        .await
        .unwrap();
    trail.log_event(AuditEventType::AuthSuccess, "login").await;
    assert_eq!(trail.stats().total_events, 1);

    registry.reset(Some("payments")).await;
    assert!(registry.get("payments").is_none());

    // A fresh instance starts a new sequence but storage still verifies
    // per-file; reuse a different name to keep the chain clean.
    let fresh = registry
        .get_or_create("payments-2", CompliancePolicy::gdpr(), Some(dir.path().to_path_buf()))
        .await
        .unwrap();
    assert_eq!(fresh.stats().total_events, 0);
}

#[tokio::test]
async fn disabled_policy_skips_validation_warnings() {
    // Out-of-range values with a disabled policy must not warn; this is
    // primarily a does-not-crash check since warnings go to tracing.
    let policy = CompliancePolicy {
        enabled: false,
        retention_days: 1,
        archive_after_days: 1,
        require_integrity_check: false,
        ..Default::default()
    };
    let trail = AuditTrail::new("quiet", policy);
    trail.start().await.unwrap();
    assert!(trail.stats().policy_summary.contains("enabled=false"));
}
