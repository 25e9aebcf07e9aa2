// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading finished albums, copying cover pages, and serializing.

pub mod reader;
pub mod writer;

pub use reader::{PdfReader, prepend_pages};
pub use writer::{Finalized, serialize};
