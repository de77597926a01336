//! Client address derivation from forwarding headers.

use std::net::IpAddr;

use http::HeaderMap;

/// Address reported when no forwarding header yields a usable address.
const FALLBACK_ADDR: &str = "127.0.0.1";

/// Derive the client address used as the rate limit identity.
///
/// Precedence is fixed: the first hop of `x-forwarded-for`, then
/// `x-real-ip`, then the loopback fallback. Both headers are spoofable
/// unless a trusted proxy in front of the gateway strips and re-sets them;
/// deployments without one should harden this function.
pub(crate) fn derive(headers: &HeaderMap) -> String {
    if let Some(forwarded_for) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded_for.to_str()
        && let Some(first_hop) = value.split(',').next()
        && let Ok(ip) = first_hop.trim().parse::<IpAddr>()
    {
        return ip.to_string();
    }

    if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && let Ok(ip) = value.trim().parse::<IpAddr>()
    {
        return ip.to_string();
    }

    FALLBACK_ADDR.to_string()
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn forwarded_for_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!("203.0.113.7", derive(&headers));
    }

    #[test]
    fn real_ip_is_the_second_choice() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!("198.51.100.2", derive(&headers));
    }

    #[test]
    fn malformed_forwarded_for_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-address"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!("198.51.100.2", derive(&headers));
    }

    #[test]
    fn no_headers_means_loopback() {
        assert_eq!("127.0.0.1", derive(&HeaderMap::new()));
    }
}
