// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory resolver for previews, tests, and assets already decoded by the
// host application.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use photobook_core::{ResolutionError, ResourceHandle};

use crate::traits::AssetResolver;

/// Serves bytes from a pre-populated map. Unknown handles are `NotFound`.
#[derive(Debug, Default)]
pub struct InMemoryResolver {
    /// Bytes served per handle.
    assets: HashMap<ResourceHandle, Vec<u8>>,
    /// Number of `resolve` calls, hits and misses alike.
    resolve_calls: AtomicUsize,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_asset(mut self, handle: impl Into<ResourceHandle>, bytes: Vec<u8>) -> Self {
        self.insert(handle, bytes);
        self
    }

    pub fn insert(&mut self, handle: impl Into<ResourceHandle>, bytes: Vec<u8>) {
        self.assets.insert(handle.into(), bytes);
    }

    /// Number of `resolve` calls served so far, hits and misses alike.
    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AssetResolver for InMemoryResolver {
    async fn resolve(&self, handle: &ResourceHandle) -> Result<Vec<u8>, ResolutionError> {
        self.resolve_calls.fetch_add(1, Ordering::Relaxed);
        match self.assets.get(handle) {
            Some(bytes) => Ok(bytes.clone()),
            None => {
                tracing::debug!(%handle, "in-memory asset missing");
                Err(ResolutionError::NotFound(handle.to_string()))
            }
        }
    }
}
