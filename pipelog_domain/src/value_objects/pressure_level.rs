// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pressure Level Value Object
//!
//! The four-step pressure ladder driven by queue fill. The adaptive
//! controller moves at most one step per evaluation, so the ladder also
//! provides `next_up` / `next_down` navigation.
//!
//! The integer index (0..=3) is exported to metrics as a gauge; the
//! lower-case string form appears in diagnostics records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pressure level of the logging pipeline, ordered `Normal < Elevated <
/// High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureLevel {
    Normal,
    Elevated,
    High,
    Critical,
}

impl PressureLevel {
    /// All levels in ascending order.
    pub const ALL: [PressureLevel; 4] = [
        PressureLevel::Normal,
        PressureLevel::Elevated,
        PressureLevel::High,
        PressureLevel::Critical,
    ];

    /// Ladder index (0 for `Normal` .. 3 for `Critical`). Exported as the
    /// pressure gauge value.
    pub fn index(self) -> usize {
        match self {
            PressureLevel::Normal => 0,
            PressureLevel::Elevated => 1,
            PressureLevel::High => 2,
            PressureLevel::Critical => 3,
        }
    }

    /// Lower-case name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            PressureLevel::Normal => "normal",
            PressureLevel::Elevated => "elevated",
            PressureLevel::High => "high",
            PressureLevel::Critical => "critical",
        }
    }

    /// The next level up the ladder, or `self` at the top.
    pub fn next_up(self) -> PressureLevel {
        match self {
            PressureLevel::Normal => PressureLevel::Elevated,
            PressureLevel::Elevated => PressureLevel::High,
            PressureLevel::High => PressureLevel::Critical,
            PressureLevel::Critical => PressureLevel::Critical,
        }
    }

    /// The next level down the ladder, or `self` at the bottom.
    pub fn next_down(self) -> PressureLevel {
        match self {
            PressureLevel::Normal => PressureLevel::Normal,
            PressureLevel::Elevated => PressureLevel::Normal,
            PressureLevel::High => PressureLevel::Elevated,
            PressureLevel::Critical => PressureLevel::High,
        }
    }
}

impl fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(PressureLevel::Normal < PressureLevel::Elevated);
        assert!(PressureLevel::Elevated < PressureLevel::High);
        assert!(PressureLevel::High < PressureLevel::Critical);
    }

    #[test]
    fn test_index_matches_ladder_position() {
        for (i, level) in PressureLevel::ALL.iter().enumerate() {
            assert_eq!(level.index(), i);
        }
    }

    #[test]
    fn test_next_up_saturates() {
        assert_eq!(PressureLevel::Normal.next_up(), PressureLevel::Elevated);
        assert_eq!(PressureLevel::Critical.next_up(), PressureLevel::Critical);
    }

    #[test]
    fn test_next_down_saturates() {
        assert_eq!(PressureLevel::Critical.next_down(), PressureLevel::High);
        assert_eq!(PressureLevel::Normal.next_down(), PressureLevel::Normal);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&PressureLevel::High).unwrap(), "\"high\"");
    }
}
