// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan cleanup — built-in highlight removal and high-pass sharpening.

pub mod highlight;
pub mod sharpen;

pub use highlight::remove_highlights;
pub use sharpen::high_pass;
