use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use narrative_metrics::{AnalysisResult, Pipeline, RunConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Narrative metrics over a game event dump and outline", long_about = None)]
struct Args {
    /// TOML run configuration (defaults apply to anything it leaves out)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the input files, overrides the configuration
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Directory receiving metrics/ and tables/, overrides the configuration
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn load_config(args: &Args) -> AnalysisResult<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let summary = load_config(&args).and_then(|config| Pipeline::new(config).run());

    match summary {
        Ok(summary) => {
            println!("{summary}");
            if summary.all_completed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "run aborted");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
