//! Latest-edition resolution.
//!
//! Given "now", the resolver walks back through a bounded window of calendar
//! days (today first), derives each day's edition URL and probes it. The
//! first hit wins and scanning stops; if every candidate misses, the result
//! is a [`ResolutionResult::NotFound`].
//!
//! Probes run strictly one after another. Checking in recency order and
//! stopping at the first hit keeps the request count minimal and makes
//! "most recent wins" trivially true.
//!
//! The resolver is the error boundary of the lookup: it never returns an
//! `Err`. Date arithmetic and template failures are reported as `NotFound`
//! carrying the underlying message.

use crate::config::EditionConfig;
use crate::dates::{candidate_dates, display_token};
use crate::models::{Edition, ResolutionResult};
use crate::prober::ProbeExists;
use crate::template::{PathTemplate, TemplateError};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Reason reported when no candidate in the window exists.
pub const NOT_FOUND_REASON: &str = "Keine aktuelle Zeitung gefunden";

/// Failures outside the normal probe path.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("date {offset} days before {today} is out of range")]
    DateOutOfRange { today: NaiveDate, offset: u32 },

    #[error("invalid path template: {0}")]
    Template(#[from] TemplateError),
}

/// Finds the most recent edition within the configured lookback window.
#[derive(Debug)]
pub struct EditionResolver<P> {
    config: EditionConfig,
    prober: P,
}

impl<P> EditionResolver<P>
where
    P: ProbeExists + Sync,
{
    pub fn new(config: EditionConfig, prober: P) -> Self {
        Self { config, prober }
    }

    /// Resolve against the local wall clock.
    pub async fn resolve_now(&self) -> ResolutionResult {
        self.resolve_latest_edition(&Local::now()).await
    }

    /// Resolve the newest edition on or before `now`'s calendar day.
    ///
    /// Issues at most `lookback_days + 1` probes, in order of increasing
    /// offset, and stops at the first hit. Identical `now` and identical probe
    /// answers always produce an identical result.
    #[instrument(level = "info", skip_all, fields(today = %now.date_naive()))]
    pub async fn resolve_latest_edition<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> ResolutionResult {
        let t0 = Instant::now();
        let result = match self.scan(now.date_naive()).await {
            Ok(Some(edition)) => {
                info!(url = %edition.url, title = %edition.title, "Found latest edition");
                ResolutionResult::Found(edition)
            }
            Ok(None) => {
                warn!(
                    lookback_days = self.config.lookback_days,
                    "No edition found in lookback window"
                );
                ResolutionResult::NotFound {
                    reason: NOT_FOUND_REASON.to_string(),
                }
            }
            Err(e) => {
                error!(error = %e, "Edition resolution failed");
                ResolutionResult::NotFound {
                    reason: e.to_string(),
                }
            }
        };
        info!(
            elapsed_ms = t0.elapsed().as_millis(),
            found = result.is_found(),
            "Resolution complete"
        );
        result
    }

    async fn scan(&self, today: NaiveDate) -> Result<Option<Edition>, ResolveError> {
        let template = PathTemplate::parse(&self.config.path_template)?;
        let candidates = candidate_dates(today, self.config.lookback_days)?;

        for (offset, date) in candidates.into_iter().enumerate() {
            let url = template.edition_url(&self.config.base_url, date);
            info!(offset, %url, "Checking edition");

            if self.prober.probe_exists(&url).await {
                return Ok(Some(self.edition(url, date)));
            }
        }
        Ok(None)
    }

    fn edition(&self, url: String, date: NaiveDate) -> Edition {
        let display_date = display_token(date);
        Edition {
            url,
            title: format!("{} - {}", self.config.display_name, display_date),
            display_date,
            date,
        }
    }
}
