// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Rotating File Sink
//!
//! JSON-lines delivery to a file with size-based rotation. When the
//! active file would exceed `max_bytes`, it is renamed to
//! `<path>.1`, existing rotations shift up (`.1` → `.2`, …), the oldest
//! beyond `max_files` is deleted, and a fresh active file is opened.
//!
//! Rotation happens inline on the writing worker; the files are opened in
//! append mode so a restart continues the active file.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use pipelog_domain::services::Sink;
use pipelog_domain::{LogError, SerializedView};

use crate::infrastructure::serialization::frame_json_line;

struct ActiveFile {
    file: File,
    written: u64,
}

/// Size-rotated JSON-lines file sink.
pub struct RotatingFileSink {
    path: PathBuf,
    max_bytes: u64,
    max_files: usize,
    active: Mutex<Option<ActiveFile>>,
}

impl RotatingFileSink {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, max_files: usize) -> Self {
        Self {
            path: path.into(),
            max_bytes: max_bytes.max(1),
            max_files: max_files.max(1),
            active: Mutex::new(None),
        }
    }

    async fn open_active(&self) -> Result<ActiveFile, LogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        let written = file.metadata().await?.len();
        Ok(ActiveFile { file, written })
    }

    async fn rotate(&self) -> Result<(), LogError> {
        // Shift `.N` up, oldest first; delete anything past max_files.
        let _ = tokio::fs::remove_file(self.rotated_path(self.max_files)).await;
        for index in (1..self.max_files).rev() {
            let from = self.rotated_path(index);
            let to = self.rotated_path(index + 1);
            let _ = tokio::fs::rename(&from, &to).await;
        }
        tokio::fs::rename(&self.path, self.rotated_path(1)).await?;
        Ok(())
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }
}

#[async_trait]
impl Sink for RotatingFileSink {
    fn name(&self) -> &str {
        "rotating_file"
    }

    async fn write(&self, view: &SerializedView) -> Result<(), LogError> {
        let framed = frame_json_line(view);
        let mut guard = self.active.lock().await;

        if guard.is_none() {
            *guard = Some(self.open_active().await?);
        }

        let needs_rotation = guard
            .as_ref()
            .map(|active| active.written > 0 && active.written + framed.len() as u64 > self.max_bytes)
            .unwrap_or(false);
        if needs_rotation {
            if let Some(mut active) = guard.take() {
                active.file.flush().await?;
            }
            self.rotate().await?;
            *guard = Some(self.open_active().await?);
        }

        let active = guard.as_mut().ok_or_else(|| LogError::io_error("no active log file"))?;
        active.file.write_all(&framed).await?;
        active.written += framed.len() as u64;
        Ok(())
    }

    async fn stop(&self) -> Result<(), LogError> {
        if let Some(active) = self.active.lock().await.as_mut() {
            active.file.flush().await?;
        }
        Ok(())
    }
}
