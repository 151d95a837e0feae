use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tracker_announce::{cli, orchestrator::Orchestrator, report};

// Usage: tracker-announce [--port N] [--timeout SECS] [--json] <file.torrent>...
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();
    info!(torrents = args.paths.len(), port = args.port, "announcing");

    let orchestrator = Orchestrator::new(args.client_config())?;
    let reports = orchestrator.run(&args.paths).await;

    if args.json {
        println!("{}", report::to_json(&reports)?);
    } else {
        for report in &reports {
            println!("{}", report);
        }
    }

    if reports.iter().any(|report| report.outcome.is_err()) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
