//! Same-origin passthrough for edition PDFs.
//!
//! Browsers refuse to let a page on one origin read a PDF from another, so
//! the viewer loads documents through `/api/pdf-proxy?url=...`. The relay
//! only forwards to the configured publisher origin; anything else is
//! rejected before a request leaves the process. Redirects are followed only
//! while they stay on that origin, and a publisher that stops sending for
//! longer than `proxy_read_timeout_ms` is answered with `502`.

use crate::config::EditionConfig;
use crate::errors::{AppError, AppResult};
use crate::server::AppState;
use crate::utils::truncate_for_log;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use reqwest::{Client, redirect::Policy};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::{Origin, Url};

/// Route the proxy is mounted on.
pub const PROXY_ROUTE: &str = "/api/pdf-proxy";

/// Redirect hops followed within the publisher origin.
const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

/// Same-origin path that relays `pdf_url`.
pub fn proxy_path(pdf_url: &str) -> String {
    format!("{}?url={}", PROXY_ROUTE, urlencoding::encode(pdf_url))
}

/// Build the client the proxy downloads documents with.
///
/// The client refuses any redirect hop that leaves `publisher_origin`, so a
/// redirect on the publisher cannot turn the relay into an open proxy. The
/// read timeout bounds both the wait for response headers and every gap
/// between body chunks, without capping the length of a slow but steady
/// download.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn proxy_client(
    config: &EditionConfig,
    publisher_origin: Origin,
) -> Result<Client, reqwest::Error> {
    let policy = Policy::custom(move |attempt| {
        let foreign = attempt.url().origin() != publisher_origin;
        let hops = attempt.previous().len();
        if foreign {
            attempt.error("redirect leaves the publisher origin")
        } else if hops > MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else {
            attempt.follow()
        }
    });

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.probe_timeout())
        .read_timeout(config.proxy_read_timeout())
        .redirect(policy)
        .build()
}

/// Validate a requested target against the publisher origin.
pub fn checked_target(raw: Option<&str>, state: &AppState) -> AppResult<Url> {
    let raw = raw
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::bad_request("Parameter 'url' fehlt"))?;

    let target = Url::parse(raw).map_err(|e| {
        AppError::bad_request(format!("Ungültige URL {}: {e}", truncate_for_log(raw, 200)))
    })?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(AppError::bad_request("Nur http- und https-URLs werden unterstützt"));
    }
    if target.origin() != state.publisher_origin {
        return Err(AppError::forbidden("Ziel liegt außerhalb des Verlagsservers"));
    }
    Ok(target)
}

/// Stream the document at `?url=` back to the caller.
#[instrument(level = "info", skip_all)]
pub async fn pdf_proxy(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> AppResult<Response> {
    let target = checked_target(query.url.as_deref(), &state)?;
    info!(url = %target, "Proxying edition");

    let upstream = state.client.get(target.clone()).send().await.map_err(|e| {
        warn!(
            url = %target,
            timeout = e.is_timeout(),
            redirect = e.is_redirect(),
            error = %e,
            "Upstream request failed"
        );
        AppError::bad_gateway("Die Zeitung konnte nicht geladen werden.")
    })?;

    let status = upstream.status();
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::not_found("Ausgabe nicht gefunden"));
    }
    if !status.is_success() {
        warn!(url = %target, %status, "Upstream returned an error status");
        return Err(AppError::bad_gateway(format!(
            "Verlagsserver antwortete mit {status}"
        )));
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        upstream
            .headers()
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/pdf")),
    );
    if let Some(length) = upstream.headers().get(header::CONTENT_LENGTH) {
        headers.insert(header::CONTENT_LENGTH, length.clone());
    }
    headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static("inline"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );

    let stream = upstream
        .bytes_stream()
        .inspect_err(move |e| warn!(url = %target, error = %e, "Upstream stream aborted"));

    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditionConfig;
    use axum::body::to_bytes;
    use axum::http::Request;
    use std::time::{Duration, Instant};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PDF_PATH: &str = "/media/ausgaben/2024/03/nomo_05_03_2024.pdf";

    fn state_for(base_url: &str) -> AppState {
        AppState::from_config(EditionConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn proxied(server: &MockServer, path: &str) -> String {
        proxy_path(&format!("{}{}", server.uri(), path))
    }

    async fn get(state: AppState, uri: &str) -> Response {
        crate::server::router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[test]
    fn test_proxy_path_encodes_url() {
        assert_eq!(
            proxy_path("https://example.com/a b.pdf?x=1&y=2"),
            "/api/pdf-proxy?url=https%3A%2F%2Fexample.com%2Fa%20b.pdf%3Fx%3D1%26y%3D2"
        );
    }

    #[test]
    fn test_checked_target() {
        let state = state_for("https://www.nomo-norderney.de");

        assert!(checked_target(Some("https://www.nomo-norderney.de/x.pdf"), &state).is_ok());

        let missing = checked_target(None, &state).unwrap_err();
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);

        let empty = checked_target(Some("  "), &state).unwrap_err();
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);

        let relative = checked_target(Some("/x.pdf"), &state).unwrap_err();
        assert_eq!(relative.status, StatusCode::BAD_REQUEST);

        let foreign = checked_target(Some("https://evil.example/x.pdf"), &state).unwrap_err();
        assert_eq!(foreign.status, StatusCode::FORBIDDEN);

        let downgraded = checked_target(Some("http://www.nomo-norderney.de/x.pdf"), &state).unwrap_err();
        assert_eq!(downgraded.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_proxy_streams_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PDF_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(b"%PDF-1.7 test".to_vec(), "application/pdf"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let pdf_url = format!("{}{}", server.uri(), PDF_PATH);
        let response = get(state_for(&server.uri()), &proxy_path(&pdf_url)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "inline");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "13");
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=3600"
        );
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"%PDF-1.7 test");
    }

    #[tokio::test]
    async fn test_proxy_defaults_content_type_to_pdf() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PDF_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
            .mount(&server)
            .await;

        let response = get(state_for(&server.uri()), &proxied(&server, PDF_PATH)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    }

    #[tokio::test]
    async fn test_proxy_follows_redirect_within_publisher() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old.pdf"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("{}/new.pdf", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-new".to_vec(), "application/pdf"))
            .expect(1)
            .mount(&server)
            .await;

        let response = get(state_for(&server.uri()), &proxied(&server, "/old.pdf")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"%PDF-new");
    }

    #[tokio::test]
    async fn test_proxy_refuses_redirect_to_foreign_origin() {
        let publisher = MockServer::start().await;
        let foreign = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/go.pdf"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("{}/secret", foreign.uri())),
            )
            .mount(&publisher)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("FOREIGN-BYTES"))
            .expect(0)
            .mount(&foreign)
            .await;

        let response = get(state_for(&publisher.uri()), &proxied(&publisher, "/go.pdf")).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("FOREIGN-BYTES"));
    }

    #[tokio::test]
    async fn test_proxy_stalled_upstream_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PDF_PATH))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;
        let state = AppState::from_config(EditionConfig {
            base_url: server.uri(),
            proxy_read_timeout_ms: 200,
            ..Default::default()
        })
        .unwrap();

        let t0 = Instant::now();
        let response = get(state, &proxied(&server, PDF_PATH)).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(t0.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_proxy_maps_upstream_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken.pdf"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let state = state_for(&server.uri());
        let gone = get(state.clone(), &proxy_path(&format!("{}/gone.pdf", server.uri()))).await;
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);

        let broken = get(state, &proxy_path(&format!("{}/broken.pdf", server.uri()))).await;
        assert_eq!(broken.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_proxy_rejects_foreign_origin_without_fetching() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let state = state_for("https://www.nomo-norderney.de");
        let response = get(state, &proxy_path(&format!("{}/x.pdf", server.uri()))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_proxy_requires_url_parameter() {
        let response = get(state_for("https://www.nomo-norderney.de"), PROXY_ROUTE).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
