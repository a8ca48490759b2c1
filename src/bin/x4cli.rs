// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use clap::Parser;

use x4c::cli::output::{ConsoleOutput, Output};
use x4c::cli::{report, run, Cli, CliError};
use x4c::config::{init_tracing, Settings, CLI_LOG_FILTER};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(CLI_LOG_FILTER);
    let out = ConsoleOutput;

    report(execute(cli, &out).await, &out)
}

async fn execute(cli: Cli, out: &dyn Output) -> Result<(), CliError> {
    let settings = Settings::from_env()?;
    let client = settings.load_client().await?;
    run(cli.command, &client, out).await
}
