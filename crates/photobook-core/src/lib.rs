// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photobook — Core types, configuration, and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::{ExportConfig, ProgressSplit};
pub use error::{EmbedError, PhotobookError, ResolutionError, Result};
pub use human_errors::{HumanError, Severity, humanize_error, summarize_partial};
pub use types::*;
