// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Validated runtime configuration.

pub mod settings;

pub use settings::{AdaptiveSettings, BackpressureMode, CoreSettings, RedactionSettings, Settings, SinkGuardSettings};
