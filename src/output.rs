use std::io::{self, IsTerminal, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunSummary};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// One line per event on stderr, so stdout stays clean. Colour is only used
/// when stderr is a terminal.
pub struct ConsoleProgress {
    color: bool,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn render(&self, event: &ProgressEvent) -> String {
        let (dim, cyan, reset) = if self.color {
            ("\x1b[2m", "\x1b[36m", "\x1b[0m")
        } else {
            ("", "", "")
        };
        match event.elapsed {
            Some(elapsed) => format!(
                "{dim}...{reset} {} ({} ms)",
                event.message,
                elapsed.as_millis()
            ),
            None => format!("{cyan}==>{reset} {}", event.message),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn event(&self, event: ProgressEvent) {
        let line = self.render(&event);
        if let Err(err) = writeln!(io::stderr().lock(), "{line}") {
            tracing::debug!(error = %err, "progress line not written");
        }
    }
}

pub fn print_summary(summary: &RunSummary) {
    let (green, yellow, cyan, reset) = if io::stdout().is_terminal() {
        ("\x1b[32m", "\x1b[33m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "", "")
    };

    println!(
        "{cyan}KIRA-VC summary: {} (Entrez {}){reset}",
        summary.gene, summary.entrez_gene_id
    );
    println!(
        "{green}Studies queried: {} of {}{reset}",
        summary.studies_queried, summary.studies_total
    );
    if !summary.studies_skipped.is_empty() {
        println!(
            "{yellow}Studies skipped: {}{reset}",
            summary.studies_skipped.len()
        );
        for skipped in &summary.studies_skipped {
            println!("{yellow}   {}: {}{reset}", skipped.study_id, skipped.reason);
        }
    }
    println!(
        "Mutations fetched: {} ({} with coordinates)",
        summary.rows_fetched, summary.rows_with_coordinates
    );
    println!(
        "{green}Distinct variants: {}{reset}",
        summary.distinct_variants
    );
    println!("{cyan}   output: {}{reset}", summary.output);
    if let Some(rows_output) = &summary.rows_output {
        println!("{cyan}   rows: {rows_output}{reset}");
    }
}
