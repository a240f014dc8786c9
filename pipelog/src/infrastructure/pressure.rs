// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Adaptive pressure control: the hysteresis state machine, the sampling
//! monitor task, and the actuators it drives.

pub mod actuators;
pub mod monitor;
pub mod state_machine;

pub use actuators::{queue_growth_factor, ActuatorCounters, ActuatorSet, FilterLadder};
pub use monitor::PressureMonitor;
pub use state_machine::EscalationStateMachine;
