// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Log Level Value Object
//!
//! Totally ordered severity levels with stable wire strings. The wire form
//! is the upper-case name (`"DEBUG"`, `"INFO"`, ...) and is what appears in
//! the serialized envelope; the numeric severity drives level gating and
//! protected-lane routing.
//!
//! ## Ordering
//!
//! `Debug < Info < Warning < Error < Critical < Audit < Security`
//!
//! `Audit` and `Security` extend the conventional five levels for
//! compliance-grade events; both sort above `Critical` so that protected
//! lane membership and level gates treat them as the most severe traffic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Severity level of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Audit,
    Security,
}

impl Level {
    /// All levels, in ascending severity order.
    pub const ALL: [Level; 7] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Audit,
        Level::Security,
    ];

    /// Numeric severity used by level gates (DEBUG=10 .. SECURITY=70).
    ///
    /// The decade spacing leaves room for intermediate custom severities in
    /// gate configuration without remapping existing levels.
    pub fn severity(self) -> u8 {
        match self {
            Level::Debug => 10,
            Level::Info => 20,
            Level::Warning => 30,
            Level::Error => 40,
            Level::Critical => 50,
            Level::Audit => 60,
            Level::Security => 70,
        }
    }

    /// Stable wire string (upper-case name).
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Audit => "AUDIT",
            Level::Security => "SECURITY",
        }
    }

    /// Whether this level is conventionally routed to the protected lane.
    ///
    /// This is only the default; the queue takes an explicit protected set
    /// at construction.
    pub fn default_protected(self) -> bool {
        self >= Level::Error
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARNING" | "WARN" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" => Ok(Level::Critical),
            "AUDIT" => Ok(Level::Audit),
            "SECURITY" => Ok(Level::Security),
            other => Err(LogError::invalid_config(format!(
                "Unknown log level: {}. Valid: DEBUG, INFO, WARNING, ERROR, CRITICAL, AUDIT, SECURITY",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = LogError;

    fn try_from(value: String) -> Result<Self, LogError> {
        value.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}
