// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Compliance Policy Entity
//!
//! Policy attached to an audit trail. The trail validates the policy at
//! `start()` and emits warnings (never errors) for values that fall short
//! of the selected compliance regime; validation is skipped entirely when
//! the policy is disabled.

use serde::{Deserialize, Serialize};

/// Compliance regime governing an audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceLevel {
    #[default]
    Basic,
    Sox,
    Gdpr,
    Hipaa,
}

impl ComplianceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ComplianceLevel::Basic => "basic",
            ComplianceLevel::Sox => "sox",
            ComplianceLevel::Gdpr => "gdpr",
            ComplianceLevel::Hipaa => "hipaa",
        }
    }
}

/// Retention and handling policy for an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompliancePolicy {
    /// Master toggle; a disabled policy is not validated.
    pub enabled: bool,
    pub level: ComplianceLevel,
    pub retention_days: u32,
    pub archive_after_days: u32,
    pub require_integrity_check: bool,
    /// HIPAA: restrict audit payloads to the minimum necessary fields.
    pub minimum_necessary: bool,
    /// GDPR: record support for data-subject access/erasure requests.
    pub data_subject_rights: bool,
    /// At-rest encryption of audit files. Not implemented; the trail warns
    /// when set.
    pub encrypt_audit_logs: bool,
}

impl Default for CompliancePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            level: ComplianceLevel::Basic,
            retention_days: 90,
            archive_after_days: 30,
            require_integrity_check: true,
            minimum_necessary: true,
            data_subject_rights: true,
            encrypt_audit_logs: false,
        }
    }
}

impl CompliancePolicy {
    /// Shorthand constructors for the named regimes.
    pub fn sox() -> Self {
        Self {
            level: ComplianceLevel::Sox,
            retention_days: 2555, // seven years
            archive_after_days: 365,
            ..Default::default()
        }
    }

    pub fn gdpr() -> Self {
        Self {
            level: ComplianceLevel::Gdpr,
            ..Default::default()
        }
    }

    pub fn hipaa() -> Self {
        Self {
            level: ComplianceLevel::Hipaa,
            retention_days: 2190, // six years
            archive_after_days: 365,
            ..Default::default()
        }
    }

    /// Collects policy warnings. Empty when the policy is disabled or every
    /// value meets the regime's floor.
    pub fn validation_warnings(&self) -> Vec<String> {
        if !self.enabled {
            return Vec::new();
        }
        let mut warnings = Vec::new();
        if self.retention_days < 30 {
            warnings.push(format!(
                "retention_days={} is below the 30-day compliance floor",
                self.retention_days
            ));
        }
        if self.archive_after_days < 7 {
            warnings.push(format!(
                "archive_after_days={} is below the 7-day compliance floor",
                self.archive_after_days
            ));
        }
        if !self.require_integrity_check {
            warnings.push("require_integrity_check is disabled; chain tampering will not be detected".to_string());
        }
        if self.level == ComplianceLevel::Hipaa && !self.minimum_necessary {
            warnings.push("HIPAA policy without minimum_necessary handling".to_string());
        }
        if self.level == ComplianceLevel::Gdpr && !self.data_subject_rights {
            warnings.push("GDPR policy without data_subject_rights support".to_string());
        }
        warnings
    }

    /// One-line summary for trail statistics.
    pub fn summary(&self) -> String {
        format!(
            "level={} enabled={} retention_days={} archive_after_days={} integrity_check={}",
            self.level.as_str(),
            self.enabled,
            self.retention_days,
            self.archive_after_days,
            self.require_integrity_check
        )
    }
}
