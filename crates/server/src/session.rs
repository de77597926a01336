//! Session token resolution.
//!
//! The gateway reads exactly two things from the identity token: that a
//! valid session exists, and which role it carries. Tokens are HS256 JWTs
//! signed with a shared secret by the upstream application; the gateway
//! never mints or refreshes them. Any resolution failure (missing cookie,
//! malformed token, bad signature, expired claims) means anonymous, never
//! an error.

use config::SessionConfig;
use http::{HeaderMap, header::AUTHORIZATION, header::COOKIE};
use jwt_compact::{
    AlgorithmExt, TimeOptions, UntrustedToken,
    alg::{Hs256, Hs256Key},
};
use serde::{Deserialize, Serialize};

const BEARER_PREFIX_LENGTH: usize = 6;

/// The authenticated caller as seen by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    /// Subject of the session, if the token carries one.
    pub subject: Option<String>,
    /// Role discriminator, compared against the configured admin role.
    pub role: Option<String>,
}

/// Claims the gateway understands in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SessionClaims {
    /// Subject of the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Role discriminator (e.g. "ADMIN").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Validates session tokens against the shared secret.
pub(crate) struct SessionAuth {
    key: Option<Hs256Key>,
    cookie_name: String,
    admin_role: String,
}

impl SessionAuth {
    pub(crate) fn new(config: SessionConfig) -> Self {
        let key = config.secret.as_deref().map(|secret| Hs256Key::new(secret.as_bytes()));

        if key.is_none() {
            log::warn!("no session secret configured - every request will be treated as anonymous");
        }

        Self {
            key,
            cookie_name: config.cookie_name,
            admin_role: config.admin_role,
        }
    }

    /// Resolve the identity for a request, if any.
    pub(crate) fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        let key = self.key.as_ref()?;
        let raw = self.cookie_token(headers).or_else(|| bearer_token(headers))?;

        let untrusted = UntrustedToken::new(&raw).ok()?;
        let token = Hs256.validator::<SessionClaims>(key).validate(&untrusted).ok()?;

        let claims = token.claims();
        claims.validate_expiration(&TimeOptions::default()).ok()?;

        Some(Identity {
            subject: claims.custom.sub.clone(),
            role: claims.custom.role.clone(),
        })
    }

    /// Whether the identity carries the configured admin role.
    pub(crate) fn is_admin(&self, identity: &Identity) -> bool {
        identity.role.as_deref() == Some(self.admin_role.as_str())
    }

    fn cookie_token(&self, headers: &HeaderMap) -> Option<String> {
        for header in headers.get_all(COOKIE) {
            let Ok(value) = header.to_str() else { continue };

            for pair in value.split(';') {
                if let Some((name, token)) = pair.trim().split_once('=')
                    && name == self.cookie_name
                    && !token.is_empty()
                {
                    return Some(token.to_string());
                }
            }
        }

        None
    }
}

/// Extract a bearer token from the Authorization header.
///
/// RFC 7235: the authentication scheme is case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;

    if value.len() > BEARER_PREFIX_LENGTH
        && value[..BEARER_PREFIX_LENGTH].eq_ignore_ascii_case("bearer")
        && value.as_bytes()[BEARER_PREFIX_LENGTH] == b' '
    {
        let token = value[BEARER_PREFIX_LENGTH + 1..].trim();

        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    None
}

#[cfg(test)]
pub(crate) mod tests {
    use http::HeaderValue;
    use jwt_compact::{Claims, Header};

    use super::*;

    pub(crate) const TEST_SECRET: &str = "test-session-secret";

    pub(crate) fn auth() -> SessionAuth {
        SessionAuth::new(SessionConfig {
            secret: Some(TEST_SECRET.into()),
            ..SessionConfig::default()
        })
    }

    pub(crate) fn mint_token(sub: &str, role: Option<&str>, ttl: chrono::Duration) -> String {
        let key = Hs256Key::new(TEST_SECRET.as_bytes());
        let time_options = TimeOptions::default();

        let claims = Claims::new(SessionClaims {
            sub: Some(sub.to_string()),
            role: role.map(str::to_string),
        })
        .set_duration_and_issuance(&time_options, ttl);

        Hs256.token(&Header::empty(), &claims, &key).unwrap()
    }

    fn cookie_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let cookie = format!("theme=dark; atrium_session={token}; lang=en");
        headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        headers
    }

    #[test]
    fn valid_cookie_token_resolves() {
        let auth = auth();
        let token = mint_token("user-1", Some("EDITOR"), chrono::Duration::hours(1));

        let identity = auth.resolve(&cookie_headers(&token)).unwrap();

        assert_eq!(Some("user-1"), identity.subject.as_deref());
        assert_eq!(Some("EDITOR"), identity.role.as_deref());
        assert!(!auth.is_admin(&identity));
    }

    #[test]
    fn bearer_token_is_accepted() {
        let auth = auth();
        let token = mint_token("user-2", Some("ADMIN"), chrono::Duration::hours(1));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap());

        let identity = auth.resolve(&headers).unwrap();
        assert!(auth.is_admin(&identity));
    }

    #[test]
    fn expired_token_is_anonymous() {
        let auth = auth();
        let token = mint_token("user-3", None, chrono::Duration::hours(-1));

        assert!(auth.resolve(&cookie_headers(&token)).is_none());
    }

    #[test]
    fn garbage_token_is_anonymous() {
        let auth = auth();
        assert!(auth.resolve(&cookie_headers("not-a-jwt")).is_none());
    }

    #[test]
    fn wrong_signature_is_anonymous() {
        let auth = SessionAuth::new(SessionConfig {
            secret: Some("a-different-secret".into()),
            ..SessionConfig::default()
        });
        let token = mint_token("user-4", Some("ADMIN"), chrono::Duration::hours(1));

        assert!(auth.resolve(&cookie_headers(&token)).is_none());
    }

    #[test]
    fn missing_secret_means_anonymous() {
        let auth = SessionAuth::new(SessionConfig::default());
        let token = mint_token("user-5", None, chrono::Duration::hours(1));

        assert!(auth.resolve(&cookie_headers(&token)).is_none());
    }
}
