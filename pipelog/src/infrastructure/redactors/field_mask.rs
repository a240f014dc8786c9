// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Field Mask Redactor
//!
//! Masks the values of configured key names, recursively, anywhere in the
//! event's `data` and `context` mappings. Key matching is
//! case-insensitive. A matched value is masked whole: scalars become
//! `"***"`, containers have every leaf masked, so no fragment of the
//! original survives.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::{Map, Value};

use pipelog_domain::entities::log_envelope::MASK;
use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::services::Redactor;
use pipelog_domain::LogError;

/// Key names masked by default. The list follows the usual suspects in
/// leaked-credential postmortems.
pub const DEFAULT_MASKED_KEYS: [&str; 12] = [
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "authorization",
    "auth",
    "access_key",
    "private_key",
    "session",
    "cookie",
];

/// Configuration for key-based masking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMaskConfig {
    /// Lower-cased key names whose values are masked.
    pub masked_keys: HashSet<String>,
}

impl Default for FieldMaskConfig {
    fn default() -> Self {
        Self {
            masked_keys: DEFAULT_MASKED_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl FieldMaskConfig {
    pub fn with_keys<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self {
            masked_keys: keys.into_iter().map(|k| k.into().to_lowercase()).collect(),
        }
    }
}

/// Masks values of well-known secret-bearing keys.
pub struct FieldMaskRedactor {
    config: FieldMaskConfig,
}

impl FieldMaskRedactor {
    pub fn new() -> Self {
        Self {
            config: FieldMaskConfig::default(),
        }
    }

    pub fn with_config(config: FieldMaskConfig) -> Self {
        Self { config }
    }

    fn mask_map(&self, map: Map<String, Value>) -> Map<String, Value> {
        map.into_iter()
            .map(|(key, value)| {
                if self.config.masked_keys.contains(&key.to_lowercase()) {
                    (key, mask_whole(value))
                } else {
                    (key, self.mask_children(value))
                }
            })
            .collect()
    }

    fn mask_children(&self, value: Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.mask_map(map)),
            Value::Array(items) => Value::Array(items.into_iter().map(|item| self.mask_children(item)).collect()),
            other => other,
        }
    }
}

fn mask_whole(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, mask_whole(v))).collect()),
        Value::Array(items) => Value::Array(items.into_iter().map(mask_whole).collect()),
        _ => Value::String(MASK.to_string()),
    }
}

impl Default for FieldMaskRedactor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Redactor for FieldMaskRedactor {
    fn name(&self) -> &str {
        "field_mask"
    }

    async fn redact(&self, mut event: LogEnvelope) -> Result<LogEnvelope, LogError> {
        event.data = self.mask_map(event.data);
        event.context = self.mask_map(event.context);
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipelog_domain::entities::{build_envelope, EnvelopeSeed, ExceptionSettings};
    use pipelog_domain::Level;
    use serde_json::json;

    fn event(extra: Map<String, Value>) -> LogEnvelope {
        build_envelope(
            EnvelopeSeed {
                level: Some(Level::Info),
                message: "m".into(),
                extra: Some(extra),
                ..Default::default()
            },
            &ExceptionSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_top_level_key_masked() {
        let mut extra = Map::new();
        extra.insert("password".into(), json!("hunter2"));
        extra.insert("user".into(), json!("alice"));
        let out = FieldMaskRedactor::new().redact(event(extra)).await.unwrap();
        assert_eq!(out.data["password"], json!("***"));
        assert_eq!(out.data["user"], json!("alice"));
    }

    #[tokio::test]
    async fn test_nested_key_masked() {
        let mut extra = Map::new();
        extra.insert("request".into(), json!({"headers": {"Authorization": "Bearer abc"}}));
        let out = FieldMaskRedactor::new().redact(event(extra)).await.unwrap();
        assert_eq!(out.data["request"]["headers"]["Authorization"], json!("***"));
    }

    #[tokio::test]
    async fn test_matched_container_masked_whole() {
        let mut extra = Map::new();
        extra.insert("secret".into(), json!({"inner": "value", "n": 3}));
        let out = FieldMaskRedactor::new().redact(event(extra)).await.unwrap();
        assert_eq!(out.data["secret"]["inner"], json!("***"));
        assert_eq!(out.data["secret"]["n"], json!("***"));
    }

    #[tokio::test]
    async fn test_case_insensitive_match() {
        let mut extra = Map::new();
        extra.insert("API_KEY".into(), json!("k-123"));
        let out = FieldMaskRedactor::new().redact(event(extra)).await.unwrap();
        assert_eq!(out.data["API_KEY"], json!("***"));
    }

    #[tokio::test]
    async fn test_idempotent() {
        let mut extra = Map::new();
        extra.insert("password".into(), json!("hunter2"));
        let r = FieldMaskRedactor::new();
        let once = r.redact(event(extra)).await.unwrap();
        let twice = r.redact(once.clone()).await.unwrap();
        assert_eq!(once.data, twice.data);
    }

    #[tokio::test]
    async fn test_custom_keys() {
        let mut extra = Map::new();
        extra.insert("internal_id".into(), json!("x-1"));
        extra.insert("password".into(), json!("kept"));
        let r = FieldMaskRedactor::with_config(FieldMaskConfig::with_keys(["internal_id"]));
        let out = r.redact(event(extra)).await.unwrap();
        assert_eq!(out.data["internal_id"], json!("***"));
        assert_eq!(out.data["password"], json!("kept"));
    }
}
