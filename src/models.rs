//! Data models for edition lookups.
//!
//! - [`Edition`]: a located edition with its display strings
//! - [`ResolutionResult`]: outcome of one resolution attempt
//! - [`NewspaperResult`]: the flat JSON record handed to the viewer
//!
//! All values are built fresh per resolution; nothing here is cached.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An edition that was found at its publisher URL.
///
/// Internal only; the viewer receives the flat [`NewspaperResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edition {
    /// Absolute URL of the edition PDF.
    pub url: String,
    /// `"{display_name} - DD.MM.YYYY"`.
    pub title: String,
    /// `DD.MM.YYYY`.
    pub display_date: String,
    /// Calendar date of the edition.
    pub date: NaiveDate,
}

/// Outcome of [`crate::resolver::EditionResolver::resolve_latest_edition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    Found(Edition),
    NotFound { reason: String },
}

impl ResolutionResult {
    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionResult::Found(_))
    }
}

/// Wire record consumed by the viewer.
///
/// ```json
/// { "success": true, "pdfUrl": "...", "title": "...", "date": "05.03.2024" }
/// { "success": false, "error": "Keine aktuelle Zeitung gefunden" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewspaperResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ResolutionResult> for NewspaperResult {
    fn from(result: &ResolutionResult) -> Self {
        match result {
            ResolutionResult::Found(edition) => NewspaperResult {
                success: true,
                pdf_url: Some(edition.url.clone()),
                title: Some(edition.title.clone()),
                date: Some(edition.display_date.clone()),
                error: None,
            },
            ResolutionResult::NotFound { reason } => NewspaperResult {
                success: false,
                pdf_url: None,
                title: None,
                date: None,
                error: Some(reason.clone()),
            },
        }
    }
}

impl From<ResolutionResult> for NewspaperResult {
    fn from(result: ResolutionResult) -> Self {
        NewspaperResult::from(&result)
    }
}
