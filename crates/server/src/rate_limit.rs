//! Rate limiting middleware for HTTP requests.

use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::body::Body;
use http::{
    Request, Response, StatusCode,
    header::{CONTENT_TYPE, RETRY_AFTER},
};
use rate_limit::{RateLimitManager, RateLimitRequest};
use tower::Layer;

use crate::client_ip;

const THROTTLED_MESSAGE: &str = "Too many requests. Please try again later.";

#[derive(Clone)]
pub(crate) struct RateLimitLayer(Arc<RateLimitManager>);

impl RateLimitLayer {
    pub(crate) fn new(manager: Arc<RateLimitManager>) -> Self {
        Self(manager)
    }
}

impl<Service> Layer<Service> for RateLimitLayer
where
    Service: Send + Clone,
{
    type Service = RateLimitService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        RateLimitService {
            next,
            manager: self.0.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct RateLimitService<Service> {
    next: Service,
    manager: Arc<RateLimitManager>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for RateLimitService<Service>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Send + Clone + 'static,
    Service::Future: Send,
    Service::Error: Display + 'static,
    ReqBody: http_body::Body + Send + 'static,
{
    type Response = http::Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut next = self.next.clone();
        let manager = self.manager.clone();

        Box::pin(async move {
            let rate_limit_request = RateLimitRequest::builder()
                .client_addr(client_ip::derive(req.headers()))
                .route(req.uri().path())
                .build();

            let err = match manager.check_request(&rate_limit_request).await {
                Ok(_decision) => {
                    // Request allowed, continue to next handler.
                    return next.call(req).await;
                }
                Err(err) => err,
            };

            log::debug!("request rejected due to rate limit: {err}");

            // Whole seconds, rounded up so a client that waits the full
            // Retry-After always lands in a fresh window.
            let reset_seconds = err.retry_after().as_millis().div_ceil(1000).max(1);

            let body = serde_json::json!({ "error": THROTTLED_MESSAGE });

            let response = Response::builder()
                .status(StatusCode::TOO_MANY_REQUESTS)
                .header(CONTENT_TYPE, "application/json")
                .header(RETRY_AFTER, reset_seconds.to_string())
                .header("x-ratelimit-remaining", "0")
                .header("x-ratelimit-reset", reset_seconds.to_string())
                .body(Body::from(body.to_string()))
                .unwrap();

            Ok(response)
        })
    }
}
