// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// URI-style resolver for handles produced by the host application.
//
// Supported forms:
//   data:<mime>;base64,<payload>   inline image, decoded in memory
//   file:///abs/path.jpg           local file
//   asset:<id>                     bundled asset, looked up in an `AssetCatalog`
//   relative/or/absolute/path      local file, relative to the base directory
//
// Remote URLs are not fetched here; the host downloads them first.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use photobook_core::{ResolutionError, ResourceHandle};
use tracing::{debug, instrument};

use crate::traits::AssetResolver;

/// Lookup service mapping bundled asset IDs to files.
///
/// Built by the host at startup and handed to the resolver, so the engine
/// itself never hardcodes asset identifiers.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    /// Asset id to file path.
    entries: HashMap<String, PathBuf>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.insert(id, path);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(id.into(), path.into());
    }

    pub fn lookup(&self, id: &str) -> Option<&Path> {
        self.entries.get(id).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves data URIs, file paths, and catalog IDs.
#[derive(Debug, Clone, Default)]
pub struct UriResolver {
    /// Lookup table for `asset:` references.
    catalog: AssetCatalog,
    /// Directory relative paths are resolved against.
    base_dir: Option<PathBuf>,
}

impl UriResolver {
    pub fn new(catalog: AssetCatalog) -> Self {
        Self {
            catalog,
            base_dir: None,
        }
    }

    /// Resolve relative paths (and relative catalog entries) against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    async fn read_file(
        &self,
        handle: &ResourceHandle,
        path: &Path,
    ) -> Result<Vec<u8>, ResolutionError> {
        let path = self.absolute(path);
        tokio::fs::read(&path).await.map_err(|err| match err.kind() {
            ErrorKind::NotFound => ResolutionError::NotFound(path.display().to_string()),
            _ => ResolutionError::Io {
                handle: handle.to_string(),
                detail: err.to_string(),
            },
        })
    }
}

#[async_trait]
impl AssetResolver for UriResolver {
    #[instrument(skip_all, fields(handle = %handle))]
    async fn resolve(&self, handle: &ResourceHandle) -> Result<Vec<u8>, ResolutionError> {
        let reference = handle.as_str();

        if let Some(rest) = reference.strip_prefix("data:") {
            return decode_data_uri(rest);
        }

        if let Some(path) = reference.strip_prefix("file://") {
            return self.read_file(handle, Path::new(path)).await;
        }

        if let Some(id) = reference.strip_prefix("asset:") {
            let path = self
                .catalog
                .lookup(id)
                .ok_or_else(|| ResolutionError::NotFound(format!("asset:{id}")))?
                .to_path_buf();
            debug!(id, path = %path.display(), "catalog hit");
            return self.read_file(handle, &path).await;
        }

        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Err(ResolutionError::Unsupported(handle.to_string()));
        }

        if reference.is_empty() {
            return Err(ResolutionError::NotFound("<empty handle>".to_string()));
        }

        self.read_file(handle, Path::new(reference)).await
    }
}

/// Decode the part of a data URI after `data:`.
fn decode_data_uri(rest: &str) -> Result<Vec<u8>, ResolutionError> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ResolutionError::InvalidDataUri("missing ',' separator".to_string()))?;

    if !meta.ends_with(";base64") {
        return Err(ResolutionError::InvalidDataUri(format!(
            "only base64 payloads are supported, got {meta:?}"
        )));
    }

    // Payloads copied out of JSON or mail often carry line breaks.
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|err| ResolutionError::InvalidDataUri(err.to_string()))
}
