// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio — batch digitizer for scanned books.
//
// Entry point. Initialises logging, builds the pipeline configuration from the
// command line, and runs the selected stages.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use folio_core::error::{ErrorClass, FolioError};
use folio_pipeline::Pipeline;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Exit status for a bad input or option, or a missing stage input.
const EXIT_PRECONDITION: u8 = 2;
const EXIT_FAILURE: u8 = 1;

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "run failed");
            for cause in err.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
            ExitCode::from(exit_status(&err))
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.pipeline_config().context("invalid options")?;

    info!(
        input = %cli.input.display(),
        output = %cli.output.display(),
        prefix = %config.prefix,
        "Folio starting"
    );

    let report = Pipeline::new(&config)
        .run(&cli.input, &cli.output)
        .with_context(|| format!("processing {}", cli.input.display()))?;

    match &report.document {
        Some(doc) => info!(
            document = %doc.path.display(),
            pages = doc.pages,
            manifest = %report.manifest_path().display(),
            "Done"
        ),
        None => info!(
            artifacts = %report.artifact_dir.display(),
            manifest = %report.manifest_path().display(),
            "Done; no document assembled"
        ),
    }
    Ok(())
}

fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<FolioError>().map(FolioError::class) {
        Some(ErrorClass::Precondition) => EXIT_PRECONDITION,
        _ => EXIT_FAILURE,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
