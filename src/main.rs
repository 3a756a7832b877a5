//! # NoMo Viewer
//!
//! Finds the most recent daily edition of a newspaper that publishes its
//! issues as PDFs under a date-based URL, and serves it to browsers through a
//! same-origin proxy.
//!
//! ## Usage
//!
//! ```sh
//! nomo_viewer resolve
//! nomo_viewer serve --bind 127.0.0.1:3000
//! ```
//!
//! ## Architecture
//!
//! 1. **Candidates**: today and the seven days before it, newest first
//! 2. **Probing**: a `HEAD` request per candidate URL, one at a time
//! 3. **Resolution**: the first existing edition wins; an exhausted window is
//!    reported as "Keine aktuelle Zeitung gefunden"
//! 4. **Viewing**: the viewer page embeds the edition via `/api/pdf-proxy`

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dates;
mod errors;
mod models;
mod outputs;
mod prober;
mod proxy;
mod resolver;
mod server;
mod template;
mod utils;
mod viewer;

use cli::{Cli, Command};
use models::NewspaperResult;
use prober::HttpProber;
use resolver::EditionResolver;

#[tokio::main]
#[instrument]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("nomo_viewer starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = match config::load_effective(args.config.as_deref(), args.overrides()).await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        base_url = %config.base_url,
        lookback_days = config.lookback_days,
        probe_timeout_ms = config.probe_timeout_ms,
        "Configuration loaded"
    );

    let code = match args.command {
        Command::Resolve { json_output } => {
            let prober = HttpProber::from_config(&config)?;
            let resolver = EditionResolver::new(config, prober);
            let result = resolver.resolve_now().await;
            let record = NewspaperResult::from(&result);

            println!("{}", serde_json::to_string_pretty(&record)?);
            if let Some(path) = json_output {
                outputs::json::write_result(&record, &path).await?;
            }

            if result.is_found() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Serve { .. } => {
            server::serve(config).await?;
            ExitCode::SUCCESS
        }
    };

    let elapsed = start_time.elapsed();
    info!(?elapsed, "Execution complete");
    Ok(code)
}
