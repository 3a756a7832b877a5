//! Server-rendered viewer shell.
//!
//! The page embeds the resolved edition through the same-origin proxy and
//! leaves pagination and zoom to the browser's PDF viewer. When no edition
//! can be found it shows an error page whose retry link starts a new
//! resolution from today.

use crate::models::{Edition, ResolutionResult};
use crate::proxy::proxy_path;
use crate::server::AppState;
use crate::utils::escape_html;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::instrument;

/// Shown when a failure carries no message of its own.
pub const GENERIC_FAILURE: &str = "Die Zeitung konnte nicht geladen werden.";

const STYLE: &str = "\
body{margin:0;font-family:system-ui,sans-serif;background:#f3f4f6;color:#1f2937}\
header{display:flex;align-items:center;justify-content:space-between;gap:1rem;\
padding:.75rem 1rem;background:#fff;border-bottom:1px solid #e5e7eb}\
h1{font-size:1.25rem;margin:0}\
a.button{padding:.6rem 1.2rem;border-radius:.5rem;background:#2563eb;color:#fff;text-decoration:none;font-weight:600}\
iframe{display:block;width:100%;height:calc(100vh - 4rem);border:0}\
.error{max-width:28rem;margin:4rem auto;padding:2rem;text-align:center;\
background:#fee2e2;border:1px solid #fca5a5;border-radius:.5rem}\
.error h1{color:#991b1b;margin-bottom:1rem}\
.error a.button{background:#dc2626}";

/// `GET /`
#[instrument(level = "info", skip_all)]
pub async fn index(State(state): State<AppState>) -> Response {
    match state.resolver.resolve_now().await {
        ResolutionResult::Found(edition) => Html(render_viewer(&edition)).into_response(),
        ResolutionResult::NotFound { reason } => {
            (StatusCode::SERVICE_UNAVAILABLE, Html(render_error(&reason))).into_response()
        }
    }
}

pub fn render_viewer(edition: &Edition) -> String {
    let title = escape_html(&edition.title);
    let src = escape_html(&proxy_path(&edition.url));
    format!(
        r#"<!DOCTYPE html>
<html lang="de">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<header>
<h1>{title}</h1>
<a class="button" href="{src}" target="_blank" rel="noopener">PDF öffnen</a>
</header>
<iframe src="{src}" title="{title}"></iframe>
</body>
</html>
"#
    )
}

pub fn render_error(reason: &str) -> String {
    let message = if reason.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        escape_html(reason)
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="de">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Fehler beim Laden der Zeitung</title>
<style>{STYLE}</style>
</head>
<body>
<div class="error">
<h1>Fehler beim Laden der Zeitung</h1>
<p>{message}</p>
<a class="button" href="/">Erneut versuchen</a>
</div>
</body>
</html>
"#
    )
}
