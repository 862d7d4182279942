use std::{io::IsTerminal, path::PathBuf};

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use itertools::Itertools;
use miette::{IntoDiagnostic, Result};
use niftest::{ScanOptions, ScanReport, Scanner};
use owo_colors::OwoColorize;
use tes_nif::NifOptions;
use tes_vfs::CaseFolding;
use tracing_log::AsTrace;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Model files, BSA archives or directories to scan
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Fail on block types without a decoder instead of keeping them as raw bytes
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// How many archives deep nested archives are mounted
    #[arg(long, value_name = "N", default_value_t = 4)]
    max_depth: usize,

    /// Fold path case with Unicode rules instead of ASCII only
    #[arg(long, default_value_t = false)]
    unicode_paths: bool,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

impl Cli {
    fn options(&self) -> ScanOptions {
        ScanOptions::builder()
            .nif(NifOptions::builder().permissive(!self.strict).build())
            .max_depth(self.max_depth)
            .case_folding(if self.unicode_paths {
                CaseFolding::Unicode
            } else {
                CaseFolding::Ascii
            })
            .build()
    }
}

fn summary(report: &ScanReport) {
    for failure in report.failures.iter().sorted_by(|a, b| a.path.cmp(&b.path)) {
        println!("{} {}: {}", "✗".red(), failure.path, failure.message);
    }
    for skipped in &report.skipped {
        println!("{} {}: {}", "-".yellow(), skipped.path, skipped.reason);
    }

    println!(
        "{} decoded, {} failed, {} nested archives skipped",
        report.decoded.len().green(),
        report.failures.len().red(),
        report.skipped.len().yellow(),
    );
}

fn main() -> Result<()> {
    better_panic::install();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(std::io::stdout().is_terminal())
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .with(
            EnvFilter::builder()
                .with_default_directive(cli.verbose.log_level_filter().as_trace().into())
                .from_env_lossy(),
        )
        .try_init()
        .into_diagnostic()?;

    let report = Scanner::new(cli.options()).scan(&cli.inputs);
    summary(&report);

    Ok(())
}
