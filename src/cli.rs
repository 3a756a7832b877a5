//! Command-line interface definitions for NoMo Viewer.
//!
//! All settings can be given as flags, environment variables or in a YAML
//! config file; flags and environment variables take precedence.

use crate::config::PartialConfig;
use clap::{Parser, Subcommand};

/// Command-line arguments for NoMo Viewer.
///
/// # Examples
///
/// ```sh
/// # Print the latest edition as JSON
/// nomo_viewer resolve
///
/// # Same, also writing the record to a file
/// nomo_viewer resolve --json-output ./public/edition.json
///
/// # Serve the viewer on all interfaces
/// nomo_viewer serve --bind 0.0.0.0:8080
///
/// # Point at a different publisher
/// nomo_viewer --config ./inselbote.yaml serve
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, global = true, env = "NOMO_CONFIG")]
    pub config: Option<String>,

    /// Publisher origin, e.g. https://www.nomo-norderney.de
    #[arg(long, global = true, env = "NOMO_BASE_URL")]
    pub base_url: Option<String>,

    /// Edition path below the base URL; placeholders {year} {month} {day} {date}
    #[arg(long, global = true, env = "NOMO_PATH_TEMPLATE")]
    pub path_template: Option<String>,

    /// Publication name used in titles
    #[arg(long, global = true, env = "NOMO_DISPLAY_NAME")]
    pub display_name: Option<String>,

    /// Number of days to look back after today
    #[arg(long, global = true, env = "NOMO_LOOKBACK_DAYS")]
    pub lookback_days: Option<u32>,

    /// Timeout of a single existence probe, in milliseconds
    #[arg(long, global = true, env = "NOMO_PROBE_TIMEOUT_MS")]
    pub probe_timeout_ms: Option<u64>,

    /// Longest wait for the publisher while proxying a document, in milliseconds
    #[arg(long, global = true, env = "NOMO_PROXY_READ_TIMEOUT_MS")]
    pub proxy_read_timeout_ms: Option<u64>,

    /// User-Agent sent to the publisher
    #[arg(long, global = true, env = "NOMO_USER_AGENT")]
    pub user_agent: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find the latest edition and print it as JSON
    Resolve {
        /// Also write the JSON record to this file
        #[arg(short, long)]
        json_output: Option<String>,
    },
    /// Serve the viewer, edition API and PDF proxy over HTTP
    Serve {
        /// Listen address
        #[arg(short, long, env = "NOMO_BIND")]
        bind: Option<String>,
    },
}

impl Cli {
    /// Settings given on the command line, to be layered over the config file.
    pub fn overrides(&self) -> PartialConfig {
        let bind = match &self.command {
            Command::Serve { bind } => bind.clone(),
            Command::Resolve { .. } => None,
        };
        PartialConfig {
            base_url: self.base_url.clone(),
            path_template: self.path_template.clone(),
            display_name: self.display_name.clone(),
            lookback_days: self.lookback_days,
            probe_timeout_ms: self.probe_timeout_ms,
            proxy_read_timeout_ms: self.proxy_read_timeout_ms,
            user_agent: self.user_agent.clone(),
            bind,
        }
    }
}
