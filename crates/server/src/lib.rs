//! Atrium server library.
//!
//! Provides a reusable serve function for the binary and for integration
//! tests: route gate, rate limiting, and the reverse proxy to the upstream
//! content application.

#![deny(missing_docs)]

mod client_ip;
mod gate;
mod health;
mod proxy;
mod rate_limit;
mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use ::rate_limit::RateLimitManager;
use anyhow::anyhow;
use axum::{Router, routing::get};
use axum_server::tls_rustls::RustlsConfig;
use config::Config;
use crate::gate::RouteGateLayer;
use crate::rate_limit::RateLimitLayer;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Configuration for serving Atrium.
pub struct ServeConfig {
    /// The socket address (IP and port) the server will bind to.
    pub listen_address: SocketAddr,
    /// The deserialized Atrium TOML configuration.
    pub config: Config,
}

/// Starts and runs the Atrium gateway with the provided configuration.
pub async fn serve(ServeConfig { listen_address, config }: ServeConfig) -> anyhow::Result<()> {
    let cancellation = CancellationToken::new();
    // Stops the rate limit sweep when serve returns, so the lifecycle of the
    // background task matches the lifecycle of the server.
    let _sweep_guard = cancellation.clone().drop_guard();

    // Everything the gate admits is forwarded to the upstream application.
    let mut app = proxy::router(&config.server.upstream)?;

    if config.server.rate_limits.enabled {
        log::debug!("initializing rate limit manager with configured presets");
        let manager = Arc::new(RateLimitManager::new(config.server.rate_limits.clone()));
        manager.start_sweep(cancellation.child_token());

        app = app.layer(RateLimitLayer::new(manager));
    } else {
        log::debug!("rate limiting disabled - no manager created");
    }

    // The gate runs before the limiter: redirected requests never consume a
    // rate limit slot.
    app = app.layer(RouteGateLayer::new(config.routes.clone(), config.session.clone()));

    // Health endpoint is merged after the middleware stack, so it is neither
    // gated nor rate limited.
    if config.server.health.enabled {
        if let Some(listen) = config.server.health.listen {
            tokio::spawn(health::bind_health_endpoint(
                listen,
                config.server.tls.clone(),
                config.server.health.clone(),
            ));
        } else {
            let health_router = Router::new().route(&config.server.health.path, get(health::health));
            app = app.merge(health_router);
        }
    }

    let listener = TcpListener::bind(listen_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {listen_address}: {e}"))?;

    match &config.server.tls {
        Some(tls_config) => {
            let rustls_config = RustlsConfig::from_pem_file(&tls_config.certificate, &tls_config.key)
                .await
                .map_err(|e| anyhow!("Failed to load TLS certificate and key: {e}"))?;

            log::info!(
                "Atrium gateway listening on https://{listen_address}, upstream {}",
                config.server.upstream.url
            );

            axum_server::from_tcp_rustls(listener.into_std()?, rustls_config)
                .serve(app.into_make_service())
                .await
                .map_err(|e| anyhow!("Failed to start HTTPS server: {e}"))?;
        }
        None => {
            log::info!(
                "Atrium gateway listening on http://{listen_address}, upstream {}",
                config.server.upstream.url
            );

            axum::serve(listener, app)
                .await
                .map_err(|e| anyhow!("Failed to start HTTP server: {e}"))?;
        }
    }

    Ok(())
}
