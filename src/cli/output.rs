// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Printing for CLI commands, behind a trait so tests can capture it.

use super::CliError;

pub trait Output: Send + Sync {
    fn print(&self, msg: &str);

    fn error(&self, msg: &str);

    /// Pretty-printed JSON.
    fn print_json(&self, data: &serde_json::Value) -> Result<(), CliError> {
        self.print(&serde_json::to_string_pretty(data)?);
        Ok(())
    }

    fn header(&self, title: &str) {
        self.print(&format!("\n{}\n{}", title, "=".repeat(title.len())));
    }

    /// `Operation injected: <indexer web>/<hash>`.
    fn operation(&self, web_url: &str, hash: &str) {
        self.print(&format!("Operation injected: {web_url}/{hash}"));
    }
}

pub struct ConsoleOutput;

impl Output for ConsoleOutput {
    fn print(&self, msg: &str) {
        println!("{msg}");
    }

    fn error(&self, msg: &str) {
        eprintln!("{msg}");
    }
}
