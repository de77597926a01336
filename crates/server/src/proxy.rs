//! Reverse proxy to the upstream content application.
//!
//! Pages, admin forms, and CRUD endpoints are external collaborators; the
//! gateway forwards everything it admits and treats the upstream as opaque.

use anyhow::Context as _;
use axum::{
    Router,
    body::Body,
    extract::State,
    response::{IntoResponse, Response},
};
use config::UpstreamConfig;
use http::{
    Request, StatusCode,
    header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING},
};
use url::Url;

/// Upper bound on buffered request bodies forwarded upstream.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
struct Upstream {
    client: reqwest::Client,
    base: Url,
}

/// Build the proxy router forwarding every unmatched request upstream.
pub(crate) fn router(config: &UpstreamConfig) -> anyhow::Result<Router> {
    let client = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .build()
        .context("failed to build the upstream HTTP client")?;

    let upstream = Upstream {
        client,
        base: config.url.clone(),
    };

    Ok(Router::new().fallback(forward).with_state(upstream))
}

async fn forward(State(upstream): State<Upstream>, req: Request<Body>) -> Response {
    match upstream.send(req).await {
        Ok(response) => response,
        Err(error) => {
            log::error!("upstream request failed: {error:#}");
            (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
        }
    }
}

impl Upstream {
    async fn send(&self, req: Request<Body>) -> anyhow::Result<Response> {
        let (parts, body) = req.into_parts();

        let mut url = self.base.clone();
        url.set_path(parts.uri.path());
        url.set_query(parts.uri.query());

        let mut headers = parts.headers;
        // Hop-by-hop headers stay on this hop; reqwest sets its own Host.
        headers.remove(HOST);
        headers.remove(CONNECTION);

        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .context("failed to buffer the request body")?;

        let upstream_response = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .context("upstream did not respond")?;

        let status = upstream_response.status();
        let mut response_headers = upstream_response.headers().clone();
        // The body is re-framed after buffering.
        response_headers.remove(CONNECTION);
        response_headers.remove(TRANSFER_ENCODING);
        response_headers.remove(CONTENT_LENGTH);

        let bytes = upstream_response
            .bytes()
            .await
            .context("failed to read the upstream response body")?;

        let mut response = Response::builder().status(status);

        if let Some(headers) = response.headers_mut() {
            *headers = response_headers;
        }

        response
            .body(Body::from(bytes))
            .context("failed to assemble the proxied response")
    }
}
