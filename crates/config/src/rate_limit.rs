//! Rate limiting configuration structures.

use duration_str::deserialize_duration;
use serde::Deserialize;
use std::time::Duration;

/// Rate limiting configuration for the server.
///
/// Three presets cover the traffic classes the gateway distinguishes: a
/// permissive default for generic API traffic, a strict preset for
/// login/registration-adjacent endpoints, and a very strict preset for
/// expensive operations such as verification-email resends. Which preset
/// applies to a path is configuration, not code.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled.
    pub enabled: bool,
    /// Interval between background sweeps of expired window entries.
    #[serde(deserialize_with = "deserialize_duration")]
    pub sweep_interval: Duration,
    /// Quota applied when no stricter preset matches the path.
    pub default: RateLimitQuota,
    /// Quota for authentication endpoints (registration, login).
    pub auth: RateLimitQuota,
    /// Quota for expensive endpoints (verification resend).
    pub sensitive: RateLimitQuota,
    /// Path prefixes billed against the auth quota.
    pub auth_paths: Vec<String>,
    /// Path prefixes billed against the sensitive quota.
    pub sensitive_paths: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sweep_interval: Duration::from_secs(60),
            default: RateLimitQuota {
                limit: 100,
                duration: Duration::from_secs(60),
            },
            auth: RateLimitQuota {
                limit: 5,
                duration: Duration::from_secs(60),
            },
            sensitive: RateLimitQuota {
                limit: 3,
                duration: Duration::from_secs(3600),
            },
            auth_paths: vec!["/api/auth/register".into(), "/api/auth/login".into()],
            sensitive_paths: vec!["/api/auth/resend-verification".into()],
        }
    }
}

/// Configuration for a rate limit quota.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitQuota {
    /// Maximum number of requests allowed within the duration window.
    pub limit: u32,
    /// Time window for the rate limit.
    #[serde(deserialize_with = "deserialize_duration")]
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_presets() {
        let config = RateLimitConfig::default();

        assert!(!config.enabled);
        assert_eq!(100, config.default.limit);
        assert_eq!(Duration::from_secs(60), config.default.duration);
        assert_eq!(5, config.auth.limit);
        assert_eq!(Duration::from_secs(60), config.auth.duration);
        assert_eq!(3, config.sensitive.limit);
        assert_eq!(Duration::from_secs(3600), config.sensitive.duration);
    }

    #[test]
    fn deserialize_quotas() {
        let toml = r#"
            enabled = true
            sweep_interval = "30s"

            [default]
            limit = 1000
            duration = "60s"

            [auth]
            limit = 10
            duration = "1m"

            [sensitive]
            limit = 2
            duration = "2h"
        "#;

        let config: RateLimitConfig = toml::from_str(toml).unwrap();

        assert!(config.enabled);
        assert_eq!(Duration::from_secs(30), config.sweep_interval);
        assert_eq!(1000, config.default.limit);
        assert_eq!(10, config.auth.limit);
        assert_eq!(Duration::from_secs(60), config.auth.duration);
        assert_eq!(2, config.sensitive.limit);
        assert_eq!(Duration::from_secs(7200), config.sensitive.duration);
    }

    #[test]
    fn custom_paths() {
        let toml = r#"
            auth_paths = ["/api/signup"]
            sensitive_paths = ["/api/resend", "/api/export"]
        "#;

        let config: RateLimitConfig = toml::from_str(toml).unwrap();

        insta::assert_debug_snapshot!(&config.auth_paths, @r#"
        [
            "/api/signup",
        ]
        "#);
        insta::assert_debug_snapshot!(&config.sensitive_paths, @r#"
        [
            "/api/resend",
            "/api/export",
        ]
        "#);
    }
}
