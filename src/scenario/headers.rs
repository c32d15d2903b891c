// Response header scenarios
// Outputs are the response header set as a JSON object.

use super::{Invocation, Outcome, Scenario};
use crate::error::{Error, Result};
use crate::models::Category;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

/// Origins allowed to make credentialed cross-origin calls
pub const ALLOWED_ORIGINS: &[&str] = &["https://app.example.com", "https://admin.example.com"];

lazy_static! {
    static ref SESSION_ID_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9_-]{16,128}$").unwrap();
}

/// Baseline protections every hardened response carries
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "no-store"),
    ("Content-Security-Policy", "default-src 'self'; frame-ancestors 'none'"),
    ("Content-Type", "application/json; charset=utf-8"),
    ("Permissions-Policy", "camera=(), microphone=(), geolocation=()"),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
    ("Strict-Transport-Security", "max-age=31536000; includeSubDomains"),
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
];

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "headers/security-headers",
            Category::Header,
            "Return sensitive data with or without protective headers",
            unsafe_security_headers,
            safe_security_headers,
        )
        .with_sample_input("{\"idCard\":\"110101XXXXXXXX1234\"}"),
        Scenario::new(
            "headers/session-cookie",
            Category::Header,
            "Issue a session cookie for the given session id",
            unsafe_session_cookie,
            safe_session_cookie,
        )
        .with_sample_input("3f9c2b7e8a1d4c6f9b0e"),
        Scenario::new(
            "headers/cors",
            Category::Header,
            "Answer a cross-origin request from the given Origin",
            unsafe_cors,
            safe_cors,
        )
        .with_sample_input("https://evil.example.net"),
    ]
}

type HeaderMap = BTreeMap<&'static str, String>;

fn render(headers: &HeaderMap) -> Result<String> {
    Ok(serde_json::to_string(headers)?)
}

fn unsafe_security_headers(_inv: &Invocation<'_>) -> Result<Outcome> {
    let mut headers = HeaderMap::new();
    headers.insert("Server", "Apache/2.4.1 (Unix)".to_string());
    headers.insert("X-Powered-By", "PHP/7.4.0".to_string());
    Ok(Outcome::new(
        render(&headers)?,
        "body cacheable, sniffable and frameable; server stack disclosed",
    ))
}

fn safe_security_headers(_inv: &Invocation<'_>) -> Result<Outcome> {
    let headers: HeaderMap = SECURITY_HEADERS
        .iter()
        .map(|(name, value)| (*name, value.to_string()))
        .collect();
    Ok(Outcome::new(render(&headers)?, "baseline protective headers attached"))
}

fn unsafe_session_cookie(inv: &Invocation<'_>) -> Result<Outcome> {
    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", format!("sessionId={}; Max-Age=3600", inv.raw));
    Ok(Outcome::new(
        render(&headers)?,
        "cookie readable from script and sent over plain HTTP and cross-site",
    ))
}

fn safe_session_cookie(inv: &Invocation<'_>) -> Result<Outcome> {
    let id = inv.raw.trim();
    if !SESSION_ID_PATTERN.is_match(id) {
        return Err(Error::InvalidInput("malformed session id".to_string()));
    }
    let mut headers = HeaderMap::new();
    headers.insert(
        "Set-Cookie",
        format!("sessionId={}; Max-Age=3600; Path=/; HttpOnly; Secure; SameSite=Strict", id),
    );
    Ok(Outcome::new(render(&headers)?, "cookie scoped with HttpOnly, Secure and SameSite"))
}

fn unsafe_cors(_inv: &Invocation<'_>) -> Result<Outcome> {
    let mut headers = HeaderMap::new();
    headers.insert("Access-Control-Allow-Origin", "*".to_string());
    headers.insert("Access-Control-Allow-Credentials", "true".to_string());
    Ok(Outcome::new(render(&headers)?, "any origin may read credentialed responses"))
}

fn safe_cors(inv: &Invocation<'_>) -> Result<Outcome> {
    let origin = inv.raw.trim();
    let mut headers = HeaderMap::new();
    headers.insert("Vary", "Origin".to_string());
    let side_effect = if ALLOWED_ORIGINS.contains(&origin) {
        headers.insert("Access-Control-Allow-Origin", origin.to_string());
        headers.insert("Access-Control-Allow-Credentials", "true".to_string());
        format!("origin {} is allow-listed", origin)
    } else {
        format!("origin {} not allow-listed, no CORS grant", origin)
    };
    Ok(Outcome::new(render(&headers)?, side_effect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn headers_of(outcome: &Outcome) -> Value {
        serde_json::from_str(&outcome.output).unwrap()
    }

    #[test]
    fn hardened_set_has_every_header() {
        let out = safe_security_headers(&Invocation::new("")).unwrap();
        let headers = headers_of(&out);
        for (name, _) in SECURITY_HEADERS {
            assert!(headers.get(*name).is_some(), "missing {}", name);
        }
        assert!(headers.get("Server").is_none());
    }

    #[test]
    fn cookie_flags() {
        let out = safe_session_cookie(&Invocation::new("abcdefghijklmnop")).unwrap();
        let cookie = headers_of(&out)["Set-Cookie"].as_str().unwrap().to_string();
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(safe_session_cookie(&Invocation::new("x; Domain=evil")).is_err());
    }

    #[test]
    fn cors_echoes_only_allowed_origins() {
        let ok = headers_of(&safe_cors(&Invocation::new("https://app.example.com")).unwrap());
        assert_eq!(ok["Access-Control-Allow-Origin"], "https://app.example.com");

        let denied = headers_of(&safe_cors(&Invocation::new("https://evil.example.net")).unwrap());
        assert!(denied.get("Access-Control-Allow-Origin").is_none());

        let wide = headers_of(&unsafe_cors(&Invocation::new("https://evil.example.net")).unwrap());
        assert_eq!(wide["Access-Control-Allow-Origin"], "*");
    }
}
