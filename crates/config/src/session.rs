//! Session token validation settings.

use serde::Deserialize;

/// Session token validation settings.
///
/// The gateway never creates or refreshes sessions; it only validates the
/// identity token the upstream application issues and reads two fields from
/// it: presence and role.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Shared secret used to validate the session token signature.
    ///
    /// Usually injected from the environment: `secret = "{{ env.ATRIUM_SESSION_SECRET }}"`.
    /// When unset, every request is treated as anonymous.
    pub secret: Option<String>,
    /// Name of the cookie carrying the session token.
    pub cookie_name: String,
    /// Role claim value that grants access to admin-only routes.
    pub admin_role: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            cookie_name: "atrium_session".into(),
            admin_role: "ADMIN".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();

        assert!(config.secret.is_none());
        assert_eq!("atrium_session", config.cookie_name);
        assert_eq!("ADMIN", config.admin_role);
    }

    #[test]
    fn deserialize_full() {
        let toml = r#"
            secret = "super-secret"
            cookie_name = "session"
            admin_role = "admin"
        "#;

        let config: SessionConfig = toml::from_str(toml).unwrap();

        assert_eq!(Some("super-secret"), config.secret.as_deref());
        assert_eq!("session", config.cookie_name);
        assert_eq!("admin", config.admin_role);
    }
}
