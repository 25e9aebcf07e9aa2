// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photobook Assets — collaborator abstractions for the export engine.
//
// Defines the `AssetResolver` and `ProgressSink` traits the engine is driven
// through, the parsed `CoverDocument`, and two resolvers: an in-memory map and
// a URI resolver backed by a bundled-asset catalog.

pub mod cover;
pub mod memory;
pub mod traits;
pub mod uri;

pub use cover::CoverDocument;
pub use memory::InMemoryResolver;
pub use traits::{AssetResolver, ProgressSink};
pub use uri::{AssetCatalog, UriResolver};
