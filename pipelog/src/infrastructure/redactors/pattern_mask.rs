// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pattern Mask Redactor
//!
//! Masks PII-shaped substrings inside string values: email addresses,
//! social security numbers, phone numbers, and credit card numbers.
//! Unlike the key-based [`FieldMaskRedactor`], this redactor inspects
//! *values*, so a secret pasted into a free-text field still gets caught.
//!
//! Patterns are compiled once at startup and reused for every event.
//! Format separators are preserved (`user@example.com` becomes
//! `***@***.com`) so operators can still recognize the field's shape.
//!
//! [`FieldMaskRedactor`]: super::field_mask::FieldMaskRedactor

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::services::Redactor;
use pipelog_domain::LogError;

/// Compiled patterns for PII detection.
///
/// Note: these patterns are known-good at compile time. If compilation
/// fails, we fall back to a regex that matches nothing rather than
/// panicking. The fallback pattern `[^\s\S]` matches nothing (neither
/// whitespace nor non-whitespace).
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .unwrap_or_else(|_| Regex::new(r"[^\s\S]").unwrap_or_else(|_| unsafe { std::hint::unreachable_unchecked() }))
});

static SSN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{3}-\d{2}-\d{4}\b")
        .unwrap_or_else(|_| Regex::new(r"[^\s\S]").unwrap_or_else(|_| unsafe { std::hint::unreachable_unchecked() }))
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b")
        .unwrap_or_else(|_| Regex::new(r"[^\s\S]").unwrap_or_else(|_| unsafe { std::hint::unreachable_unchecked() }))
});

static CREDIT_CARD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b")
        .unwrap_or_else(|_| Regex::new(r"[^\s\S]").unwrap_or_else(|_| unsafe { std::hint::unreachable_unchecked() }))
});

/// PII pattern kinds the redactor can mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiiPattern {
    /// Email addresses (user@domain.com)
    Email,
    /// Social Security Numbers (123-45-6789)
    Ssn,
    /// Phone numbers (555-123-4567)
    Phone,
    /// Credit card numbers (1234-5678-9012-3456)
    CreditCard,
}

impl PiiPattern {
    /// All supported patterns.
    pub fn all() -> Vec<PiiPattern> {
        vec![
            PiiPattern::Email,
            PiiPattern::Ssn,
            PiiPattern::Phone,
            PiiPattern::CreditCard,
        ]
    }

    fn regex(&self) -> &Regex {
        match self {
            PiiPattern::Email => &EMAIL_REGEX,
            PiiPattern::Ssn => &SSN_REGEX,
            PiiPattern::Phone => &PHONE_REGEX,
            PiiPattern::CreditCard => &CREDIT_CARD_REGEX,
        }
    }

    /// Masks a matched string, preserving format separators.
    fn mask(&self, text: &str, mask_char: char) -> String {
        match self {
            PiiPattern::Email => {
                // user@domain.com → ***@***.com
                if let Some(at_pos) = text.find('@') {
                    let (local, domain_with_at) = text.split_at(at_pos);
                    let domain = &domain_with_at[1..];
                    if let Some(dot_pos) = domain.rfind('.') {
                        let (domain_name, tld) = domain.split_at(dot_pos);
                        format!(
                            "{}@{}{}",
                            mask_char.to_string().repeat(local.len().min(3)),
                            mask_char.to_string().repeat(domain_name.len().min(3)),
                            tld
                        )
                    } else {
                        mask_char.to_string().repeat(text.len())
                    }
                } else {
                    mask_char.to_string().repeat(text.len())
                }
            }
            PiiPattern::Ssn => text.chars().map(|c| if c == '-' { '-' } else { mask_char }).collect(),
            PiiPattern::Phone | PiiPattern::CreditCard => text
                .chars()
                .map(|c| if c.is_ascii_digit() { mask_char } else { c })
                .collect(),
        }
    }
}

/// Configuration for pattern-based masking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMaskConfig {
    pub patterns: Vec<PiiPattern>,
    pub mask_char: char,
}

impl Default for PatternMaskConfig {
    fn default() -> Self {
        Self {
            patterns: PiiPattern::all(),
            mask_char: '*',
        }
    }
}

/// Masks PII-shaped substrings in event string values.
pub struct PatternMaskRedactor {
    config: PatternMaskConfig,
}

impl PatternMaskRedactor {
    pub fn new() -> Self {
        Self {
            config: PatternMaskConfig::default(),
        }
    }

    pub fn with_config(config: PatternMaskConfig) -> Self {
        Self { config }
    }

    fn mask_text(&self, text: &str) -> String {
        let mut masked = text.to_string();
        for pattern in &self.config.patterns {
            masked = pattern
                .regex()
                .replace_all(&masked, |caps: &regex::Captures| {
                    pattern.mask(&caps[0], self.config.mask_char)
                })
                .to_string();
        }
        masked
    }

    fn mask_value(&self, value: Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.mask_text(&text)),
            Value::Object(map) => Value::Object(self.mask_map(map)),
            Value::Array(items) => Value::Array(items.into_iter().map(|item| self.mask_value(item)).collect()),
            other => other,
        }
    }

    fn mask_map(&self, map: Map<String, Value>) -> Map<String, Value> {
        map.into_iter().map(|(key, value)| (key, self.mask_value(value))).collect()
    }
}

impl Default for PatternMaskRedactor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Redactor for PatternMaskRedactor {
    fn name(&self) -> &str {
        "pattern_mask"
    }

    async fn redact(&self, mut event: LogEnvelope) -> Result<LogEnvelope, LogError> {
        event.message = self.mask_text(&event.message);
        event.data = self.mask_map(event.data);
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redactor(patterns: Vec<PiiPattern>) -> PatternMaskRedactor {
        PatternMaskRedactor::with_config(PatternMaskConfig {
            patterns,
            mask_char: '*',
        })
    }

    #[test]
    fn test_mask_email() {
        let r = redactor(vec![PiiPattern::Email]);
        let out = r.mask_text("Contact: user@example.com for more info");
        assert!(out.contains("***@***.com"));
        assert!(!out.contains("user@example.com"));
    }

    #[test]
    fn test_mask_ssn() {
        let r = redactor(vec![PiiPattern::Ssn]);
        let out = r.mask_text("SSN: 123-45-6789");
        assert!(out.contains("***-**-****"));
        assert!(!out.contains("123-45-6789"));
    }

    #[test]
    fn test_mask_phone() {
        let r = redactor(vec![PiiPattern::Phone]);
        let out = r.mask_text("Call: 555-123-4567");
        assert!(out.contains("***-***-****"));
        assert!(!out.contains("555-123-4567"));
    }

    #[test]
    fn test_mask_credit_card() {
        let r = redactor(vec![PiiPattern::CreditCard]);
        let out = r.mask_text("Card: 1234-5678-9012-3456");
        assert!(out.contains("****-****-****-****"));
        assert!(!out.contains("1234-5678-9012-3456"));
    }

    #[test]
    fn test_plain_text_unchanged() {
        let r = PatternMaskRedactor::new();
        assert_eq!(r.mask_text("nothing sensitive here"), "nothing sensitive here");
    }

    #[tokio::test]
    async fn test_redact_covers_message_and_data() {
        use pipelog_domain::entities::{build_envelope, EnvelopeSeed, ExceptionSettings};
        use pipelog_domain::Level;
        use serde_json::json;

        let mut extra = Map::new();
        extra.insert("contact".into(), json!("alice@example.com"));
        let event = build_envelope(
            EnvelopeSeed {
                level: Some(Level::Info),
                message: "signup from bob@example.com".into(),
                extra: Some(extra),
                ..Default::default()
            },
            &ExceptionSettings::default(),
        );

        let out = PatternMaskRedactor::new().redact(event).await.unwrap();
        assert!(!out.message.contains("bob@example.com"));
        assert!(!out.data["contact"].as_str().unwrap().contains("alice@example.com"));
    }
}
