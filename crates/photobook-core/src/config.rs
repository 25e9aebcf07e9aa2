// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PhotobookError, Result};

/// How the 0..=100 progress range is shared between the export stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSplit {
    /// Share reported while assets are being resolved.
    pub loading: u32,
    /// Share reported while pages are assembled.
    pub assembly: u32,
    /// Share reported while the document is serialized.
    pub serialization: u32,
}

impl ProgressSplit {
    /// Sum of all shares; used as the `total` of every progress event.
    pub fn total(&self) -> u32 {
        self.loading + self.assembly + self.serialization
    }
}

impl Default for ProgressSplit {
    fn default() -> Self {
        Self {
            loading: 50,
            assembly: 45,
            serialization: 5,
        }
    }
}

/// Tunables for a single export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Maximum number of asset resolutions in flight at once.
    pub batch_size: usize,
    /// Progress allocation between stages.
    pub progress: ProgressSplit,
    /// Title written to the PDF /Info dictionary.
    pub document_title: String,
    /// Font size for text annotations that do not specify one.
    pub default_font_size: f32,
    /// Built-in font family used when an annotation names none or an unknown one.
    pub default_font: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            progress: ProgressSplit::default(),
            document_title: "Photo Album".to_string(),
            default_font_size: 16.0,
            default_font: "Helvetica".to_string(),
        }
    }
}

impl ExportConfig {
    /// Load a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PhotobookError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.progress.total() == 0 {
            return Err(PhotobookError::InvalidConfig(
                "progress split must not be all zero".to_string(),
            ));
        }
        if !(self.default_font_size.is_finite() && self.default_font_size > 0.0) {
            return Err(PhotobookError::InvalidConfig(format!(
                "default_font_size must be positive, got {}",
                self.default_font_size
            )));
        }
        Ok(())
    }
}
