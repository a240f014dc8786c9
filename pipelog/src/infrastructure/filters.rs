// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Built-in filters. These are the stock rungs of the filter-tightening
//! ladder; all are cheap enough to sit in the hot path.

pub mod first_occurrence;
pub mod level_gate;
pub mod rate_limit;
pub mod sampling;
pub mod trace_sampling;

pub use first_occurrence::{FirstOccurrenceConfig, FirstOccurrenceFilter};
pub use level_gate::LevelGateFilter;
pub use rate_limit::{RateLimitConfig, RateLimitFilter};
pub use sampling::SamplingFilter;
pub use trace_sampling::{TraceSamplingConfig, TraceSamplingFilter};
