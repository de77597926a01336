//! Route classification configuration.
//!
//! Access control is driven by static, ordered lists of path prefixes rather
//! than conditionals scattered through handlers, so the precedence and
//! completeness of the rules stays independently testable. The lists are
//! process-wide configuration: loaded once, never mutated at runtime.

use anyhow::bail;
use serde::Deserialize;

/// Access-control category a request path falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a valid session.
    Protected,
    /// Requires the absence of a session; authenticated callers are bounced.
    AuthOnly,
    /// Requires a valid session with the admin role.
    AdminOnly,
    /// No access restriction.
    Open,
}

/// Route classification for access control and cache policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    /// Path prefixes that require a valid session.
    pub protected: Vec<String>,
    /// Path prefixes that bounce an already-authenticated caller.
    pub auth_only: Vec<String>,
    /// Path prefixes gated to the admin role.
    pub admin_only: Vec<String>,
    /// Prefix under which immutable static assets are served.
    pub static_assets: String,
    /// Prefix of the public, cacheable API.
    pub public_api: String,
    /// Login page path, target of unauthenticated redirects.
    pub login_path: String,
    /// Home page path, target of unauthorized-role redirects.
    pub home_path: String,
    /// Authenticated landing page, target of auth-only bounces.
    pub dashboard_path: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            protected: vec!["/dashboard".into(), "/account".into(), "/orders".into()],
            auth_only: vec!["/login".into(), "/register".into(), "/forgot-password".into()],
            admin_only: vec!["/admin".into()],
            static_assets: "/static".into(),
            public_api: "/api/public".into(),
            login_path: "/login".into(),
            home_path: "/".into(),
            dashboard_path: "/dashboard".into(),
        }
    }
}

impl RoutesConfig {
    /// Classify a request path against the configured prefix lists.
    ///
    /// Rules are evaluated in a fixed order and the first match wins:
    /// protected, auth-only, admin-only. Cache-policy prefixes are separate
    /// predicates; access rules always take precedence over annotation.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.protected.iter().any(|prefix| matches_prefix(path, prefix)) {
            RouteClass::Protected
        } else if self.auth_only.iter().any(|prefix| matches_prefix(path, prefix)) {
            RouteClass::AuthOnly
        } else if self.admin_only.iter().any(|prefix| matches_prefix(path, prefix)) {
            RouteClass::AdminOnly
        } else {
            RouteClass::Open
        }
    }

    /// Whether the path serves a long-lived immutable static asset.
    pub fn is_static_asset(&self, path: &str) -> bool {
        matches_prefix(path, &self.static_assets)
    }

    /// Whether the path belongs to the short-lived cacheable public API.
    pub fn is_public_api(&self, path: &str) -> bool {
        matches_prefix(path, &self.public_api)
    }

    /// Reject redirect targets that cannot be carried in a `Location` header.
    ///
    /// These values end up in response headers verbatim, so they must be
    /// absolute paths made of visible ASCII only.
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        let targets = [
            ("login_path", &self.login_path),
            ("home_path", &self.home_path),
            ("dashboard_path", &self.dashboard_path),
        ];

        for (field, path) in targets {
            if !path.starts_with('/') || !path.chars().all(|c| c.is_ascii_graphic()) {
                bail!("routes.{field} is not a valid redirect target: {path:?}");
            }
        }

        Ok(())
    }
}

/// Segment-aware prefix match: `/admin` matches `/admin` and `/admin/users`,
/// but not `/administrator`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_classification() {
        let routes = RoutesConfig::default();

        assert_eq!(RouteClass::Protected, routes.classify("/dashboard"));
        assert_eq!(RouteClass::Protected, routes.classify("/account/settings"));
        assert_eq!(RouteClass::AuthOnly, routes.classify("/login"));
        assert_eq!(RouteClass::AuthOnly, routes.classify("/register"));
        assert_eq!(RouteClass::AdminOnly, routes.classify("/admin"));
        assert_eq!(RouteClass::AdminOnly, routes.classify("/admin/products/42"));
        assert_eq!(RouteClass::Open, routes.classify("/"));
        assert_eq!(RouteClass::Open, routes.classify("/blog/hello-world"));
    }

    #[test]
    fn prefix_match_is_segment_aware() {
        let routes = RoutesConfig::default();

        assert_eq!(RouteClass::Open, routes.classify("/administrator"));
        assert_eq!(RouteClass::Open, routes.classify("/dashboards"));
        assert!(!routes.is_static_asset("/staticfile.css"));
    }

    #[test]
    fn cache_prefixes() {
        let routes = RoutesConfig::default();

        assert!(routes.is_static_asset("/static/css/site.css"));
        assert!(routes.is_public_api("/api/public/products"));
        assert!(!routes.is_public_api("/api/auth/register"));
    }

    #[test]
    fn protected_wins_over_later_rules() {
        let routes = RoutesConfig {
            protected: vec!["/admin/reports".into()],
            ..RoutesConfig::default()
        };

        // Evaluation order is protected, auth-only, admin-only.
        assert_eq!(RouteClass::Protected, routes.classify("/admin/reports/daily"));
        assert_eq!(RouteClass::AdminOnly, routes.classify("/admin/users"));
    }

    #[test]
    fn redirect_targets_must_be_header_safe() {
        assert!(RoutesConfig::default().validate().is_ok());

        let relative = RoutesConfig {
            home_path: "home".into(),
            ..RoutesConfig::default()
        };
        assert!(relative.validate().unwrap_err().to_string().contains("home_path"));

        let control_char = RoutesConfig {
            login_path: "/log\u{7f}in".into(),
            ..RoutesConfig::default()
        };
        assert!(control_char.validate().unwrap_err().to_string().contains("login_path"));
    }

    #[test]
    fn deserialize_overrides() {
        let toml = r#"
            protected = ["/members"]
            admin_only = ["/backoffice"]
            static_assets = "/assets"
            login_path = "/signin"
        "#;

        let routes: RoutesConfig = toml::from_str(toml).unwrap();

        assert_eq!(RouteClass::Protected, routes.classify("/members/profile"));
        assert_eq!(RouteClass::AdminOnly, routes.classify("/backoffice"));
        assert_eq!(RouteClass::Open, routes.classify("/admin"));
        assert!(routes.is_static_asset("/assets/logo.svg"));
        assert_eq!("/signin", routes.login_path);
    }
}
