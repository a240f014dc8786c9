// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Built-in redactors. `UrlCredentialsRedactor` is part of the secure
//! default pipeline; the others are opt-in.

pub mod field_mask;
pub mod pattern_mask;
pub mod string_truncate;
pub mod url_credentials;

pub use field_mask::{FieldMaskConfig, FieldMaskRedactor};
pub use pattern_mask::{PatternMaskConfig, PatternMaskRedactor, PiiPattern};
pub use string_truncate::{StringTruncateConfig, StringTruncateRedactor};
pub use url_credentials::{UrlCredentialsConfig, UrlCredentialsRedactor};
