//! Route gate middleware.
//!
//! Every inbound request is classified against the configured route classes
//! and either passed through (optionally annotated with cache headers) or
//! redirected. Access rules run strictly before cache annotation and each
//! rule is terminal, so annotations only ever apply to requests that pass
//! every access check.

use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::body::Body;
use config::{RouteClass, RoutesConfig, SessionConfig};
use http::{
    Request, Response, StatusCode,
    header::{CACHE_CONTROL, LOCATION},
};
use tower::Layer;

use crate::session::SessionAuth;

/// One year, the conventional lifetime for fingerprinted static assets.
const STATIC_CACHE: &str = "public, max-age=31536000, immutable";
/// Short-lived shared cache for the public API, served stale while revalidating.
const PUBLIC_API_CACHE: &str = "public, max-age=60, stale-while-revalidate=300";

#[derive(Clone)]
pub(crate) struct RouteGateLayer(Arc<GateInner>);

struct GateInner {
    routes: RoutesConfig,
    auth: SessionAuth,
}

impl RouteGateLayer {
    pub(crate) fn new(routes: RoutesConfig, session: SessionConfig) -> Self {
        Self(Arc::new(GateInner {
            routes,
            auth: SessionAuth::new(session),
        }))
    }
}

impl<Service> Layer<Service> for RouteGateLayer
where
    Service: Send + Clone,
{
    type Service = RouteGateService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        RouteGateService {
            next,
            gate: self.0.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct RouteGateService<Service> {
    next: Service,
    gate: Arc<GateInner>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for RouteGateService<Service>
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
        let gate = self.gate.clone();

        Box::pin(async move {
            let path = req.uri().path().to_string();
            // Resolution failure and absence are the same thing here: the
            // gate always reaches a definite decision.
            let identity = gate.auth.resolve(req.headers());

            match gate.routes.classify(&path) {
                RouteClass::Protected if identity.is_none() => {
                    log::debug!("redirecting anonymous request for {path} to login");
                    return Ok(login_redirect(&gate.routes, &path));
                }
                RouteClass::AuthOnly if identity.is_some() => {
                    log::debug!("bouncing authenticated request for {path} to the dashboard");
                    return Ok(redirect(&gate.routes.dashboard_path));
                }
                RouteClass::AdminOnly => match &identity {
                    None => {
                        log::debug!("redirecting anonymous request for {path} to login");
                        return Ok(login_redirect(&gate.routes, &path));
                    }
                    Some(identity) if !gate.auth.is_admin(identity) => {
                        log::debug!("redirecting non-admin request for {path} home");
                        return Ok(redirect(&gate.routes.home_path));
                    }
                    Some(_) => {}
                },
                _ => {}
            }

            let mut response = next.call(req).await?;

            // The upstream application stays authoritative for any cache
            // policy it sets itself.
            if !response.headers().contains_key(CACHE_CONTROL) {
                let directive = if gate.routes.is_static_asset(&path) {
                    Some(STATIC_CACHE)
                } else if gate.routes.is_public_api(&path) {
                    Some(PUBLIC_API_CACHE)
                } else {
                    None
                };

                if let Some(directive) = directive {
                    response
                        .headers_mut()
                        .insert(CACHE_CONTROL, http::HeaderValue::from_static(directive));
                }
            }

            Ok(response)
        })
    }
}

/// Redirect to the login page, preserving the requested destination in a
/// `callbackUrl` query parameter so the login flow can return the user.
fn login_redirect(routes: &RoutesConfig, path: &str) -> Response<Body> {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("callbackUrl", path)
        .finish();

    redirect(&format!("{}?{query}", routes.login_path))
}

// Configured redirect targets are validated at load time, and callback paths
// come percent-encoded, so the location is always a valid header value.
fn redirect(location: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::TEMPORARY_REDIRECT)
        .header(LOCATION, location)
        .body(Body::empty())
        .unwrap()
}
