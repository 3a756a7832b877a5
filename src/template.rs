//! Edition URL derivation.
//!
//! A path template is literal text with date placeholders:
//!
//! | Placeholder | Expands to | Example (2024-03-05) |
//! |-------------|------------|----------------------|
//! | `{year}`    | 4-digit year | `2024` |
//! | `{month}`   | 2-digit month | `03` |
//! | `{day}`     | 2-digit day | `05` |
//! | `{date}`    | `DD_MM_YYYY` | `05_03_2024` |
//!
//! All placeholders are computed from the same candidate date, so the
//! directory segments and the filename token can never disagree.

use crate::dates::{day_token, month_token, path_token, year_token};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]*)\}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template is empty")]
    Empty,
    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),
    #[error("unbalanced brace in {0:?}")]
    Unbalanced(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Year,
    Month,
    Day,
    Date,
}

/// A parsed path template, ready to render for any date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(src: &str) -> Result<Self, TemplateError> {
        if src.trim().is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(src) {
            let Some(whole) = caps.get(0) else { continue };
            push_literal(&mut segments, &src[last..whole.start()])?;
            let segment = match &caps[1] {
                "year" => Segment::Year,
                "month" => Segment::Month,
                "day" => Segment::Day,
                "date" => Segment::Date,
                other => return Err(TemplateError::UnknownPlaceholder(other.to_string())),
            };
            segments.push(segment);
            last = whole.end();
        }
        push_literal(&mut segments, &src[last..])?;

        Ok(Self { segments })
    }

    /// Render the path for `date`. The result always starts with `/`.
    pub fn render(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Year => out.push_str(&year_token(date)),
                Segment::Month => out.push_str(&month_token(date)),
                Segment::Day => out.push_str(&day_token(date)),
                Segment::Date => out.push_str(&path_token(date)),
            }
        }
        if !out.starts_with('/') {
            out.insert(0, '/');
        }
        out
    }

    /// Full edition URL: `base_url` without trailing slashes, then the
    /// rendered path.
    pub fn edition_url(&self, base_url: &str, date: NaiveDate) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.render(date))
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) -> Result<(), TemplateError> {
    if text.contains(['{', '}']) {
        return Err(TemplateError::Unbalanced(text.to_string()));
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_BASE_URL, DEFAULT_PATH_TEMPLATE};

    fn march_5() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn test_default_template_url() {
        let template = PathTemplate::parse(DEFAULT_PATH_TEMPLATE).unwrap();
        assert_eq!(
            template.edition_url(DEFAULT_BASE_URL, march_5()),
            "https://www.nomo-norderney.de/media/ausgaben/2024/03/nomo_05_03_2024.pdf"
        );
    }

    #[test]
    fn test_date_placeholder_and_missing_leading_slash() {
        let template = PathTemplate::parse("pdf/{year}/{date}.pdf").unwrap();
        assert_eq!(
            template.edition_url("http://localhost:9000/", march_5()),
            "http://localhost:9000/pdf/2024/05_03_2024.pdf"
        );
    }

    #[test]
    fn test_directory_and_filename_agree_across_year_boundary() {
        let template = PathTemplate::parse(DEFAULT_PATH_TEMPLATE).unwrap();
        let new_years_eve = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(
            template.render(new_years_eve),
            "/media/ausgaben/2023/12/nomo_31_12_2023.pdf"
        );
    }

    #[test]
    fn test_unknown_placeholder() {
        assert_eq!(
            PathTemplate::parse("/{month:2digit}.pdf"),
            Err(TemplateError::UnknownPlaceholder("month:2digit".to_string()))
        );
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(matches!(
            PathTemplate::parse("/{year/x.pdf"),
            Err(TemplateError::Unbalanced(_))
        ));
        assert!(matches!(
            PathTemplate::parse("/year}/x.pdf"),
            Err(TemplateError::Unbalanced(_))
        ));
    }

    #[test]
    fn test_empty_template() {
        assert_eq!(PathTemplate::parse(" "), Err(TemplateError::Empty));
    }
}
