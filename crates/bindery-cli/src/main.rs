// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bindery: command-line front end for the document assembly engine.

mod cli;
mod commands;

use std::process::ExitCode;

use bindery_core::human_errors::humanize_error;
use bindery_document::Bindery;
use clap::Parser;

use crate::cli::Cli;

fn main() -> ExitCode {
    // Reports go to stdout, so logs stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = commands::load_config(cli.config.as_deref())
        .and_then(|config| {
            let cancel = commands::cancel_token(cli.timeout);
            commands::run(&Bindery::new(config), &cli.command, &cancel)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = %err, "Command failed");
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}
