// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Audit Trail Registry
//!
//! Named-instance registry for audit trails. The registry is an owned
//! component: the application constructs one and passes it where needed;
//! there is no process-wide singleton. `reset` exists for tests, which
//! need to tear instances down between cases.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use pipelog_domain::entities::CompliancePolicy;
use pipelog_domain::LogError;

use super::trail::AuditTrail;

/// Owns named audit trail instances for the logger's lifetime.
#[derive(Default)]
pub struct AuditTrailRegistry {
    trails: Mutex<HashMap<String, Arc<AuditTrail>>>,
}

impl AuditTrailRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named trail, creating and starting it on first use.
    pub async fn get_or_create(
        &self,
        name: &str,
        policy: CompliancePolicy,
        storage_dir: Option<PathBuf>,
    ) -> Result<Arc<AuditTrail>, LogError> {
        if let Some(existing) = self.trails.lock().get(name) {
            return Ok(Arc::clone(existing));
        }

        let trail = Arc::new(match storage_dir {
            Some(dir) => AuditTrail::with_storage(name, policy, dir),
            None => AuditTrail::new(name, policy),
        });
        trail.start().await?;

        // First writer wins if two callers race on the same name.
        let mut trails = self.trails.lock();
        let entry = trails.entry(name.to_string()).or_insert_with(|| Arc::clone(&trail));
        Ok(Arc::clone(entry))
    }

    pub fn get(&self, name: &str) -> Option<Arc<AuditTrail>> {
        self.trails.lock().get(name).map(Arc::clone)
    }

    pub fn names(&self) -> Vec<String> {
        self.trails.lock().keys().cloned().collect()
    }

    /// Stops and removes one named trail, or every trail when `name` is
    /// `None`. Test-only entry point by convention.
    pub async fn reset(&self, name: Option<&str>) {
        let removed: Vec<Arc<AuditTrail>> = {
            let mut trails = self.trails.lock();
            match name {
                Some(name) => trails.remove(name).into_iter().collect(),
                None => trails.drain().map(|(_, trail)| trail).collect(),
            }
        };
        for trail in removed {
            let _ = trail.stop().await;
        }
    }
}
