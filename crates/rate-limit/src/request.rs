//! Request information for rate limiting.

/// Information about a request that needs to be rate limited.
///
/// The key granularity is (client address, route): a client is limited per
/// route, not globally, so exhausting one endpoint's quota does not lock the
/// client out of the rest of the site.
#[derive(Debug, Clone)]
pub struct RateLimitRequest {
    /// Client address derived from the forwarding headers.
    pub client_addr: String,
    /// Path of the route being requested.
    pub route: String,
}

impl RateLimitRequest {
    /// Create a new builder for a rate limit request.
    pub fn builder() -> RateLimitRequestBuilder {
        RateLimitRequestBuilder::default()
    }

    /// The storage key for this request's counting window.
    pub fn key(&self) -> String {
        format!("{}:{}", self.client_addr, self.route)
    }
}

/// Builder for creating rate limit requests.
#[derive(Debug, Default)]
pub struct RateLimitRequestBuilder {
    client_addr: Option<String>,
    route: Option<String>,
}

impl RateLimitRequestBuilder {
    /// Set the client address.
    pub fn client_addr(mut self, addr: impl Into<String>) -> Self {
        self.client_addr = Some(addr.into());
        self
    }

    /// Set the route path.
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Build the rate limit request. Missing fields fall back to the
    /// loopback address and the root path.
    pub fn build(self) -> RateLimitRequest {
        RateLimitRequest {
            client_addr: self.client_addr.unwrap_or_else(|| "127.0.0.1".to_string()),
            route: self.route.unwrap_or_else(|| "/".to_string()),
        }
    }
}
