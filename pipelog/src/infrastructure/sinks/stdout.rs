// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stdout Sink
//!
//! JSON-lines delivery to standard output. Writes are serialized through
//! an async mutex so concurrent workers cannot interleave partial lines.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use pipelog_domain::services::Sink;
use pipelog_domain::{LogError, SerializedView};

use crate::infrastructure::serialization::frame_json_line;

/// Line-oriented stdout sink.
pub struct StdoutSink {
    stdout: Mutex<tokio::io::Stdout>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn write(&self, view: &SerializedView) -> Result<(), LogError> {
        let framed = frame_json_line(view);
        let mut stdout = self.stdout.lock().await;
        stdout.write_all(&framed).await?;
        stdout.flush().await?;
        Ok(())
    }
}
