// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — codec sniffing, PNG/JPEG decoding, and embedding into the
// output document.

pub mod codec;

pub use codec::{Codec, EmbeddedImage, embed, sniff_codec};
