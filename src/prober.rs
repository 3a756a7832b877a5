//! Existence checks for edition URLs.
//!
//! A probe answers a single question: is there a document at this URL right
//! now? It issues a `HEAD` request, so no body is transferred, with a
//! bounded timeout and an identifying `User-Agent`.
//!
//! # Architecture
//!
//! - [`ProbeExists`]: the seam the resolver depends on
//! - [`HttpProber`]: the `reqwest`-backed implementation
//!
//! Probes never fail: any status other than `200 OK`, a timeout, a refused
//! connection or a DNS error all collapse to `false`. There are no retries;
//! one negative answer is final for that URL within a resolution.

use crate::config::EditionConfig;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Trait for answering whether a resource exists at a URL.
pub trait ProbeExists {
    /// Returns `true` only when the resource exists and is accessible.
    fn probe_exists(&self, url: &str) -> impl Future<Output = bool> + Send;
}

/// Probes URLs with `HEAD` requests.
#[derive(Clone)]
pub struct HttpProber {
    /// Shared client carrying the `User-Agent`.
    client: Client,
    /// Per-probe deadline covering connect, request and response headers.
    timeout: Duration,
}

impl HttpProber {
    /// Create a prober that identifies itself as `user_agent` and gives each
    /// probe `timeout` to complete.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &EditionConfig) -> Result<Self, reqwest::Error> {
        Self::new(&config.user_agent, config.probe_timeout())
    }
}

impl fmt::Debug for HttpProber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpProber")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProbeExists for HttpProber {
    #[instrument(level = "debug", skip(self))]
    async fn probe_exists(&self, url: &str) -> bool {
        let t0 = Instant::now();
        let res = self.client.head(url).timeout(self.timeout).send().await;
        let elapsed_ms = t0.elapsed().as_millis();

        match res {
            Ok(resp) if resp.status() == StatusCode::OK => {
                debug!(elapsed_ms, "Probe hit");
                true
            }
            Ok(resp) => {
                debug!(elapsed_ms, status = %resp.status(), "Probe miss");
                false
            }
            Err(e) => {
                debug!(
                    elapsed_ms,
                    timeout = e.is_timeout(),
                    connect = e.is_connect(),
                    error = %e,
                    "Probe failed"
                );
                false
            }
        }
    }
}
