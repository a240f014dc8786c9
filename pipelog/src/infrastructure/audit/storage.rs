// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Audit Storage
//!
//! JSON-lines persistence for audit events. One file per instance per UTC
//! day, named `audit_<instance>_<date>.jsonl` under the storage
//! directory. File I/O runs on the blocking thread pool so the async
//! runtime never stalls on disk.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use pipelog_domain::entities::AuditEvent;
use pipelog_domain::LogError;

/// Append-only JSONL store for one audit trail instance.
#[derive(Debug, Clone)]
pub struct AuditStorage {
    dir: PathBuf,
    instance: String,
}

impl AuditStorage {
    pub fn new(dir: impl Into<PathBuf>, instance: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            instance: instance.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Active file for the current UTC day.
    pub fn current_file(&self) -> PathBuf {
        let date = chrono::Utc::now().format("%Y-%m-%d");
        self.dir.join(format!("audit_{}_{}.jsonl", self.instance, date))
    }

    /// Appends one event as a JSON line; the write runs on the blocking
    /// pool and is awaited to completion.
    pub async fn append(&self, event: &AuditEvent) -> Result<(), LogError> {
        let path = self.current_file();
        let dir = self.dir.clone();
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        tokio::task::spawn_blocking(move || -> Result<(), LogError> {
            std::fs::create_dir_all(&dir)?;
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            file.write_all(&line)?;
            Ok(())
        })
        .await
        .map_err(|e| LogError::internal_error(format!("audit write task failed: {}", e)))??;

        debug!(instance = %self.instance, "audit event persisted");
        Ok(())
    }

    /// Loads every stored event for this instance, ordered by sequence
    /// number. Unparseable lines are skipped (verification will then
    /// surface the sequence gap).
    pub async fn load_all(&self) -> Result<Vec<AuditEvent>, LogError> {
        let dir = self.dir.clone();
        let prefix = format!("audit_{}_", self.instance);

        let events = tokio::task::spawn_blocking(move || -> Result<Vec<AuditEvent>, LogError> {
            let mut files: Vec<PathBuf> = match std::fs::read_dir(&dir) {
                Ok(entries) => entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .map(|n| n.starts_with(&prefix) && n.ends_with(".jsonl"))
                            .unwrap_or(false)
                    })
                    .collect(),
                Err(_) => return Ok(Vec::new()),
            };
            files.sort();

            let mut events = Vec::new();
            for path in files {
                let content = std::fs::read_to_string(&path)?;
                for line in content.lines().filter(|line| !line.trim().is_empty()) {
                    if let Ok(event) = serde_json::from_str::<AuditEvent>(line) {
                        events.push(event);
                    }
                }
            }
            events.sort_by_key(|event| event.sequence_number);
            Ok(events)
        })
        .await
        .map_err(|e| LogError::internal_error(format!("audit read task failed: {}", e)))??;

        Ok(events)
    }
}
