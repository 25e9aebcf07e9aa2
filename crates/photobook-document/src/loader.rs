// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Asset batch loader — resolves every distinct handle an export needs with a
// bounded number of resolutions in flight.
//
// Failures are values: one missing image never cancels its neighbours. Results
// come back in request order regardless of completion order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use photobook_assets::{AssetResolver, CoverDocument};
use photobook_core::{AnnotationSet, CoverInsert, PageSet, ResolutionError, ResourceHandle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

/// One thing to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetRequest {
    /// Encoded image bytes (page, cover spread, or annotation image).
    Image(ResourceHandle),
    /// A multi-page PDF cover.
    Cover(ResourceHandle),
}

impl AssetRequest {
    pub fn handle(&self) -> &ResourceHandle {
        match self {
            Self::Image(handle) | Self::Cover(handle) => handle,
        }
    }

    fn interrupted(&self) -> ResolvedAsset {
        let err = ResolutionError::Interrupted(self.handle().to_string());
        match self {
            Self::Image(_) => ResolvedAsset::Image(Err(err)),
            Self::Cover(_) => ResolvedAsset::Cover(Err(err)),
        }
    }
}

/// Outcome of one request.
#[derive(Debug)]
pub enum ResolvedAsset {
    Image(Result<Vec<u8>, ResolutionError>),
    Cover(Result<CoverDocument, ResolutionError>),
}

impl ResolvedAsset {
    pub fn is_ok(&self) -> bool {
        match self {
            Self::Image(result) => result.is_ok(),
            Self::Cover(result) => result.is_ok(),
        }
    }
}

/// Every distinct request an export needs, in first-use order: the cover,
/// then page images, then annotation images.
pub fn plan_requests(
    pages: &PageSet,
    cover: Option<&CoverInsert>,
    annotations: &AnnotationSet,
) -> Vec<AssetRequest> {
    let mut seen = HashSet::new();
    let mut requests = Vec::new();
    let mut push = |request: AssetRequest| {
        if seen.insert(request.clone()) {
            requests.push(request);
        }
    };

    match cover {
        Some(CoverInsert::Document(handle)) => push(AssetRequest::Cover(handle.clone())),
        Some(CoverInsert::Images(handles)) => {
            for handle in handles {
                push(AssetRequest::Image(handle.clone()));
            }
        }
        None => {}
    }
    for handle in pages.iter() {
        push(AssetRequest::Image(handle.clone()));
    }
    for handle in annotations.image_refs() {
        push(AssetRequest::Image(handle));
    }

    requests
}

/// Resolves handles through an [`AssetResolver`] under a concurrency cap.
#[derive(Clone)]
pub struct AssetBatchLoader {
    /// Source of every asset.
    resolver: Arc<dyn AssetResolver>,
    /// Maximum resolutions in flight; at least 1.
    batch_size: usize,
}

impl AssetBatchLoader {
    /// `batch_size` is clamped to at least 1.
    pub fn new(resolver: Arc<dyn AssetResolver>, batch_size: usize) -> Self {
        Self {
            resolver,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resolve image handles, returning results in input order.
    pub async fn load<F>(
        &self,
        handles: &[ResourceHandle],
        on_progress: F,
    ) -> Vec<Result<Vec<u8>, ResolutionError>>
    where
        F: FnMut(usize, usize),
    {
        let requests: Vec<AssetRequest> =
            handles.iter().cloned().map(AssetRequest::Image).collect();

        self.load_requests(&requests, on_progress)
            .await
            .into_iter()
            .map(|resolved| match resolved {
                ResolvedAsset::Image(result) => result,
                // `load_requests` answers each request with its own kind.
                ResolvedAsset::Cover(_) => Err(ResolutionError::Interrupted(
                    "unexpected cover result".to_string(),
                )),
            })
            .collect()
    }

    /// Resolve a mixed request list, returning results in input order.
    ///
    /// `on_progress(completed, total)` fires after every `batch_size`
    /// completions and once more when everything has settled.
    #[instrument(skip_all, fields(requests = requests.len(), batch_size = self.batch_size))]
    pub async fn load_requests<F>(
        &self,
        requests: &[AssetRequest],
        mut on_progress: F,
    ) -> Vec<ResolvedAsset>
    where
        F: FnMut(usize, usize),
    {
        let total = requests.len();
        if total == 0 {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.batch_size));
        let mut tasks = JoinSet::new();

        for (index, request) in requests.iter().cloned().enumerate() {
            let resolver = Arc::clone(&self.resolver);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // A closed semaphore only happens on shutdown; resolve anyway.
                let _permit = semaphore.acquire_owned().await.ok();
                let resolved = resolve_one(resolver.as_ref(), &request).await;
                (index, resolved)
            });
        }

        let mut slots: Vec<Option<ResolvedAsset>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, resolved)) => slots[index] = Some(resolved),
                Err(err) => warn!(%err, "asset resolution task did not complete"),
            }
            completed += 1;
            if completed % self.batch_size == 0 || completed == total {
                on_progress(completed, total);
            }
        }

        let results: Vec<ResolvedAsset> = requests
            .iter()
            .zip(slots)
            .map(|(request, slot)| slot.unwrap_or_else(|| request.interrupted()))
            .collect();

        let failed = results.iter().filter(|r| !r.is_ok()).count();
        info!(total, failed, "asset loading complete");
        results
    }

    /// Resolve `requests` and index the outcomes by handle.
    pub async fn load_into_cache<F>(&self, requests: &[AssetRequest], on_progress: F) -> AssetCache
    where
        F: FnMut(usize, usize),
    {
        let results = self.load_requests(requests, on_progress).await;
        let mut cache = AssetCache::default();
        for (request, resolved) in requests.iter().zip(results) {
            cache.insert(request.handle().clone(), resolved);
        }
        cache
    }
}

async fn resolve_one(resolver: &dyn AssetResolver, request: &AssetRequest) -> ResolvedAsset {
    match request {
        AssetRequest::Image(handle) => {
            let result = resolver.resolve(handle).await;
            if let Err(err) = &result {
                warn!(%handle, %err, "image resolution failed");
            }
            ResolvedAsset::Image(result)
        }
        AssetRequest::Cover(handle) => {
            let result = resolver.resolve_cover(handle).await;
            if let Err(err) = &result {
                warn!(%handle, %err, "cover resolution failed");
            }
            ResolvedAsset::Cover(result)
        }
    }
}

// -- Cache --------------------------------------------------------------------

/// Resolved bytes and covers keyed by handle. Filled once, read-only during
/// assembly.
#[derive(Debug, Default)]
pub struct AssetCache {
    /// Outcome per image handle.
    images: HashMap<ResourceHandle, Result<Vec<u8>, ResolutionError>>,
    /// Outcome per cover document handle; taken out once.
    covers: HashMap<ResourceHandle, Result<CoverDocument, ResolutionError>>,
}

impl AssetCache {
    pub fn insert(&mut self, handle: ResourceHandle, resolved: ResolvedAsset) {
        match resolved {
            ResolvedAsset::Image(result) => {
                self.images.insert(handle, result);
            }
            ResolvedAsset::Cover(result) => {
                self.covers.insert(handle, result);
            }
        }
    }

    /// Bytes for `handle`, or why they are unavailable.
    pub fn image(&self, handle: &ResourceHandle) -> Result<&[u8], ResolutionError> {
        match self.images.get(handle) {
            Some(Ok(bytes)) => Ok(bytes.as_slice()),
            Some(Err(err)) => Err(err.clone()),
            None => Err(ResolutionError::NotFound(handle.to_string())),
        }
    }

    /// Move the cover document for `handle` out of the cache.
    pub fn take_cover(&mut self, handle: &ResourceHandle) -> Result<CoverDocument, ResolutionError> {
        self.covers
            .remove(handle)
            .unwrap_or_else(|| Err(ResolutionError::NotFound(handle.to_string())))
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.covers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
