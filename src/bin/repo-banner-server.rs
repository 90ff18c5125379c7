//! repo-banner-server - HTTP banner service

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use repo_banner::server::{self, BannerService};
use repo_banner::{ConfigLoader, Result, logging};

#[derive(Parser)]
#[command(name = "repo-banner-server")]
#[command(version, about = "Serve repository banners over HTTP", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(logging::level(cli.verbose, false));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server stopped");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = ConfigLoader::new().load(cli.config.as_deref())?;
    let service = Arc::new(BannerService::from_config(&config)?);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    server::run(service, &addr, config.server.workers)
}
