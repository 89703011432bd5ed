//! Polycall Probe Binary
//!
//! Run with: `polycall-probe [OPTIONS] <MANIFEST>`

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use polycall::EngineConfig;
use polycall_probe::{Manifest, Probe, ProbeReport};

#[derive(Parser)]
#[command(name = "polycall-probe")]
#[command(about = "Load a dispatch manifest and report how its queries resolve")]
#[command(version)]
struct Cli {
    /// Manifest describing types, modules and queries
    #[arg(value_name = "MANIFEST")]
    manifest: PathBuf,

    /// Engine configuration file, overrides the manifest's [engine] table
    #[arg(short = 'c', long, env = "POLYCALL_CONFIG")]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Exit with an error if any query is ambiguous
    #[arg(long)]
    deny_ambiguous: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let manifest = Manifest::load(&cli.manifest)
        .with_context(|| format!("Failed to load manifest: {}", cli.manifest.display()))?;
    let config = cli
        .config
        .as_deref()
        .map(EngineConfig::load)
        .transpose()
        .context("Failed to load engine configuration")?;

    let probe = Probe::build(&manifest, config)?;
    let report = probe.run(&manifest.queries)?;
    for diagnostic in &report.diagnostics {
        warn!("{}", diagnostic);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if cli.deny_ambiguous && report.queries.iter().any(|q| q.outcome == "ambiguous") {
        std::process::exit(1);
    }

    Ok(())
}

fn print_report(report: &ProbeReport) {
    println!(
        "{} modules, {} candidates",
        report.modules_loaded, report.candidates_accepted
    );
    for q in &report.queries {
        match q.outcome {
            "matched" => println!("{} -> {}", q.call, q.candidates.join(", ")),
            "ambiguous" => println!("{} -> ambiguous: {}", q.call, q.candidates.join(" | ")),
            _ => println!(
                "{} -> unmatched ({})",
                q.call,
                q.reason.as_deref().unwrap_or("unknown")
            ),
        }
    }
}
