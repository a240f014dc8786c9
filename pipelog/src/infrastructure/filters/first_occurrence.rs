// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # First Occurrence Filter
//!
//! The first event with a given key always passes; repeats inside the
//! window pass only at the configured subsequent sample rate (default:
//! never). The key is built from a configurable list of envelope fields
//! (default: message).
//!
//! The seen-set is bounded two ways: entries older than the window are
//! pruned, and when the set exceeds `max_keys` the oldest insertions are
//! evicted first.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::services::Filter;

/// Configuration for first-occurrence filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstOccurrenceConfig {
    /// Envelope fields concatenated into the dedup key. Recognized names:
    /// `message`, `level`, `logger`, `correlation_id`; unknown names
    /// resolve against `data` and contribute the JSON rendering.
    pub key_fields: Vec<String>,
    pub window: Duration,
    pub max_keys: usize,
    /// Probability that a repeat inside the window passes anyway.
    pub subsequent_sample_rate: f64,
}

impl Default for FirstOccurrenceConfig {
    fn default() -> Self {
        Self {
            key_fields: vec!["message".to_string()],
            window: Duration::from_secs(60),
            max_keys: 10_000,
            subsequent_sample_rate: 0.0,
        }
    }
}

struct SeenState {
    stamps: HashMap<String, Instant>,
    insertion_order: VecDeque<String>,
}

/// Passes the first occurrence of each unique key.
pub struct FirstOccurrenceFilter {
    config: FirstOccurrenceConfig,
    seen: Mutex<SeenState>,
}

impl FirstOccurrenceFilter {
    pub fn new(config: FirstOccurrenceConfig) -> Self {
        let subsequent_sample_rate = config.subsequent_sample_rate.clamp(0.0, 1.0);
        Self {
            config: FirstOccurrenceConfig {
                max_keys: config.max_keys.max(1),
                subsequent_sample_rate,
                ..config
            },
            seen: Mutex::new(SeenState {
                stamps: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
        }
    }

    fn make_key(&self, event: &LogEnvelope) -> String {
        let mut parts = Vec::with_capacity(self.config.key_fields.len());
        for field in &self.config.key_fields {
            let part = match field.as_str() {
                "message" => event.message.clone(),
                "level" => event.level.as_str().to_string(),
                "logger" => event.logger.clone(),
                "correlation_id" => event.correlation_id.clone(),
                other => event.data.get(other).map(|v| v.to_string()).unwrap_or_default(),
            };
            parts.push(part);
        }
        parts.join("|")
    }

    /// Returns true when the event should pass. Split out for clock
    /// injection in tests.
    fn admit(&self, key: String, now: Instant) -> bool {
        let mut seen = self.seen.lock();
        Self::prune_expired(&mut seen, now, self.config.window);

        if !seen.stamps.contains_key(&key) {
            seen.stamps.insert(key.clone(), now);
            seen.insertion_order.push_back(key);
            while seen.stamps.len() > self.config.max_keys {
                if let Some(oldest) = seen.insertion_order.pop_front() {
                    seen.stamps.remove(&oldest);
                } else {
                    break;
                }
            }
            return true;
        }
        drop(seen);

        self.config.subsequent_sample_rate > 0.0 && rand::random::<f64>() < self.config.subsequent_sample_rate
    }

    fn prune_expired(seen: &mut SeenState, now: Instant, window: Duration) {
        loop {
            let expired = match seen.insertion_order.front() {
                Some(oldest) => match seen.stamps.get(oldest) {
                    Some(stamp) => now.duration_since(*stamp) >= window,
                    // Already evicted by the size cap; the order slot is
                    // stale and can go regardless of age.
                    None => true,
                },
                None => break,
            };
            if !expired {
                break;
            }
            if let Some(key) = seen.insertion_order.pop_front() {
                seen.stamps.remove(&key);
            }
        }
    }
}

#[async_trait]
impl Filter for FirstOccurrenceFilter {
    fn name(&self) -> &str {
        "first_occurrence"
    }

    async fn start(&self) -> Result<(), pipelog_domain::LogError> {
        let mut seen = self.seen.lock();
        seen.stamps.clear();
        seen.insertion_order.clear();
        Ok(())
    }

    async fn filter(&self, event: LogEnvelope) -> Option<LogEnvelope> {
        let key = self.make_key(&event);
        if self.admit(key, Instant::now()) {
            Some(event)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(window_secs: u64, max_keys: usize) -> FirstOccurrenceFilter {
        FirstOccurrenceFilter::new(FirstOccurrenceConfig {
            window: Duration::from_secs(window_secs),
            max_keys,
            ..Default::default()
        })
    }

    #[test]
    fn test_first_occurrence_passes() {
        let f = filter(60, 100);
        let now = Instant::now();
        assert!(f.admit("a".into(), now));
    }

    #[test]
    fn test_repeat_within_window_dropped() {
        let f = filter(60, 100);
        let now = Instant::now();
        assert!(f.admit("a".into(), now));
        assert!(!f.admit("a".into(), now));
    }

    #[test]
    fn test_distinct_keys_independent() {
        let f = filter(60, 100);
        let now = Instant::now();
        assert!(f.admit("a".into(), now));
        assert!(f.admit("b".into(), now));
    }

    #[test]
    fn test_repeat_after_window_passes_again() {
        let f = filter(1, 100);
        let start = Instant::now();
        assert!(f.admit("a".into(), start));
        assert!(f.admit("a".into(), start + Duration::from_secs(2)));
    }

    #[test]
    fn test_max_keys_evicts_oldest() {
        let f = filter(3600, 2);
        let now = Instant::now();
        assert!(f.admit("a".into(), now));
        assert!(f.admit("b".into(), now));
        assert!(f.admit("c".into(), now)); // evicts "a"
        assert!(f.admit("a".into(), now)); // back in as a first occurrence
    }

    #[tokio::test]
    async fn test_key_built_from_message() {
        use pipelog_domain::entities::{build_envelope, EnvelopeSeed, ExceptionSettings};

        let f = filter(60, 100);
        let event = |msg: &str| {
            build_envelope(
                EnvelopeSeed {
                    message: msg.into(),
                    ..Default::default()
                },
                &ExceptionSettings::default(),
            )
        };
        assert!(f.filter(event("first")).await.is_some());
        assert!(f.filter(event("first")).await.is_none());
        assert!(f.filter(event("second")).await.is_some());
    }

    #[tokio::test]
    async fn test_start_clears_seen_set() {
        let f = filter(60, 100);
        let now = Instant::now();
        assert!(f.admit("a".into(), now));
        f.start().await.unwrap();
        assert!(f.admit("a".into(), Instant::now()));
    }
}
