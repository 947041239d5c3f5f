// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External tools — supervised process execution and the ImageMagick wrapper.

pub mod command;
pub mod imagemagick;

pub use command::{probe, run_with_timeout};
pub use imagemagick::ImageMagick;
