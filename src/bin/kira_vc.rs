use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_variant_counts::app::App;
use kira_variant_counts::cbioportal::CbioportalHttpClient;
use kira_variant_counts::config::{ConfigLoader, ConfigOverrides};
use kira_variant_counts::error::KiraError;
use kira_variant_counts::output::{ConsoleProgress, JsonOutput, OutputMode, print_summary};

#[derive(Parser)]
#[command(name = "kira-vc")]
#[command(
    about = "Count unique samples per genomic variant of a gene across all cBioPortal studies"
)]
#[command(version, author)]
struct Cli {
    /// HGNC gene symbol, e.g. TNFRSF10B
    gene: Option<String>,

    #[arg(long)]
    config: Option<String>,

    /// Aggregated CSV; a .gz suffix writes gzip
    #[arg(long, short)]
    output: Option<Utf8PathBuf>,

    /// Also write the flattened per-sample rows that have coordinates
    #[arg(long)]
    rows_output: Option<Utf8PathBuf>,

    #[arg(long)]
    base_url: Option<String>,

    #[arg(long)]
    timeout_secs: Option<u64>,

    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::UnknownGene(_) | KiraError::MissingGene | KiraError::InvalidGeneSymbol(_) => 2,
        KiraError::ConfigRead(_) => 2,
        error if error.is_remote() => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let overrides = ConfigOverrides {
        gene: cli.gene,
        base_url: cli.base_url,
        output: cli.output,
        rows_output: cli.rows_output,
        timeout_secs: cli.timeout_secs,
    };
    let resolved = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;

    let client = CbioportalHttpClient::new(&resolved.base_url, resolved.timeout)?;
    let app = App::new(client);

    match output_mode {
        OutputMode::NonInteractive => {
            let summary = app.run(&resolved, &JsonOutput)?;
            JsonOutput::print_summary(&summary).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let summary = app.run(&resolved, &ConsoleProgress::new())?;
            print_summary(&summary);
        }
    }
    Ok(())
}
