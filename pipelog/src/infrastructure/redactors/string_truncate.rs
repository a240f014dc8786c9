// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # String Truncate Redactor
//!
//! Bounds the length of string values in `data` so a single oversized
//! field (a dumped request body, a base64 blob) cannot blow up envelope
//! size downstream. Truncation happens on a char boundary and appends a
//! fixed marker so consumers can tell a bounded field from a short one.

use async_trait::async_trait;
use serde_json::{Map, Value};

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::services::Redactor;
use pipelog_domain::LogError;

/// Appended to every truncated string.
pub const TRUNCATION_MARKER: &str = "...[truncated]";

/// Configuration for string truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringTruncateConfig {
    /// Maximum retained characters (marker excluded).
    pub max_chars: usize,
}

impl Default for StringTruncateConfig {
    fn default() -> Self {
        Self { max_chars: 2048 }
    }
}

/// Truncates oversized string values in event data.
pub struct StringTruncateRedactor {
    config: StringTruncateConfig,
}

impl StringTruncateRedactor {
    pub fn new() -> Self {
        Self {
            config: StringTruncateConfig::default(),
        }
    }

    pub fn with_config(config: StringTruncateConfig) -> Self {
        Self { config }
    }

    fn truncate_string(&self, text: String) -> String {
        if text.chars().count() <= self.config.max_chars {
            return text;
        }
        let mut truncated: String = text.chars().take(self.config.max_chars).collect();
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    }

    fn truncate_value(&self, value: Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.truncate_string(text)),
            Value::Object(map) => Value::Object(self.truncate_map(map)),
            Value::Array(items) => Value::Array(items.into_iter().map(|item| self.truncate_value(item)).collect()),
            other => other,
        }
    }

    fn truncate_map(&self, map: Map<String, Value>) -> Map<String, Value> {
        map.into_iter()
            .map(|(key, value)| (key, self.truncate_value(value)))
            .collect()
    }
}

impl Default for StringTruncateRedactor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Redactor for StringTruncateRedactor {
    fn name(&self) -> &str {
        "string_truncate"
    }

    async fn redact(&self, mut event: LogEnvelope) -> Result<LogEnvelope, LogError> {
        event.data = self.truncate_map(event.data);
        Ok(event)
    }
}
