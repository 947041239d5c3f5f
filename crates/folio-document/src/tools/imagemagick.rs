// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ImageMagick wrapper — highlight removal (desaturate / level / normalize)
// and unsharp-mask sharpening, run file-to-file.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use folio_core::config::{FilterParameters, ToolSettings};
use folio_core::error::{FolioError, Result};
use tracing::{debug, instrument};

use super::command::{probe, run_with_timeout};

/// A located ImageMagick `convert` entry point.
#[derive(Debug, Clone)]
pub struct ImageMagick {
    program: String,
    timeout: Duration,
}

impl ImageMagick {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &ToolSettings) -> Self {
        Self::new(
            settings.imagemagick.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether `convert -version` runs.
    pub fn is_available(&self) -> bool {
        probe(&self.program, &["-version"])
    }

    /// Desaturate, move the white point down to `threshold`, then normalize.
    #[instrument(skip_all, fields(input = %input.display(), threshold = threshold))]
    pub fn remove_highlights(&self, input: &Path, output: &Path, threshold: u8) -> Result<()> {
        let args = highlight_args(threshold);
        debug!(?args, "Running ImageMagick highlight removal");

        let mut command = Command::new(&self.program);
        command.arg(input).args(&args).arg(output);
        self.run(command, output)
    }

    /// `-unsharp {radius}x{sigma}+{amount}+{threshold}` with `sigma = radius / 3`.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub fn unsharp(&self, input: &Path, output: &Path, params: &FilterParameters) -> Result<()> {
        let geometry = unsharp_geometry(params);
        debug!(%geometry, "Running ImageMagick unsharp mask");

        let mut command = Command::new(&self.program);
        command.arg(input).arg("-unsharp").arg(&geometry).arg(output);
        self.run(command, output)
    }

    fn run(&self, command: Command, output: &Path) -> Result<()> {
        run_with_timeout(command, &self.program, self.timeout)?;
        if !output.is_file() {
            return Err(FolioError::ExternalTool {
                tool: self.program.clone(),
                reason: format!("exited cleanly but wrote no {}", output.display()),
            });
        }
        Ok(())
    }
}

fn highlight_args(threshold: u8) -> Vec<String> {
    let white_point = threshold as f32 / 255.0 * 100.0;
    vec![
        "-modulate".into(),
        "100,0,100".into(),
        "-level".into(),
        format!("0%,{white_point:.2}%"),
        "-normalize".into(),
    ]
}

fn unsharp_geometry(params: &FilterParameters) -> String {
    format!(
        "{}x{}+{}+{}",
        params.sharpen_radius,
        params.unsharp_sigma(),
        params.sharpen_amount,
        params.sharpen_threshold
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsharp_geometry_uses_a_third_of_the_radius() {
        assert_eq!(unsharp_geometry(&FilterParameters::default()), "12x4+0.6+0.3");
    }

    #[test]
    fn level_white_point_tracks_threshold() {
        let args = highlight_args(85);
        assert_eq!(args[0], "-modulate");
        assert_eq!(args[3], "0%,33.33%");
        assert_eq!(highlight_args(255)[3], "0%,100.00%");
    }

    #[test]
    fn missing_binary_is_reported_unavailable() {
        let magick = ImageMagick::new("folio-no-such-convert", Duration::from_secs(1));
        assert!(!magick.is_available());
        let dir = tempfile::tempdir().unwrap();
        let err = magick
            .unsharp(
                &dir.path().join("in.png"),
                &dir.path().join("out.png"),
                &FilterParameters::default(),
            )
            .unwrap_err();
        assert!(matches!(err, FolioError::ToolUnavailable(_)));
    }
}
