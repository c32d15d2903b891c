// Server-side request forgery scenario

use super::{Invocation, Outcome, Scenario};
use crate::error::{Error, Result};
use crate::models::Category;
use reqwest::Url;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const ALLOWED_PORTS: &[u16] = &[80, 443];
const BLOCKED_HOST_SUFFIXES: &[&str] = &[".localhost", ".internal", ".local"];

pub fn scenarios() -> Vec<Scenario> {
    vec![Scenario::new(
        "ssrf/fetch-remote",
        Category::Ssrf,
        "Fetch a caller-supplied URL on the server's behalf",
        unsafe_fetch,
        safe_fetch,
    )
    .with_sample_input("http://169.254.169.254/latest/meta-data/")]
}

fn unsafe_fetch(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::new(
        format!("GET {}", inv.raw),
        format!(
            "would connect to {} from inside the network and echo the status line",
            inv.raw
        ),
    ))
}

fn safe_fetch(inv: &Invocation<'_>) -> Result<Outcome> {
    let url = check_outbound_url(inv.raw.trim())?;
    Ok(Outcome::new(
        format!("GET {}", url),
        "would fetch through the egress checks with redirects disabled",
    ))
}

/// Parse and vet an outbound URL: http(s) only, no credentials, default
/// ports only, and no loopback, private, link-local or metadata targets.
pub fn check_outbound_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidInput(format!("bad URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidInput(format!("scheme '{}' not allowed", url.scheme())));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(Error::InvalidInput("credentials in URL".to_string()));
    }
    match url.port_or_known_default() {
        Some(port) if ALLOWED_PORTS.contains(&port) => {}
        other => {
            return Err(Error::InvalidInput(format!("port {:?} not allowed", other)));
        }
    }

    // "localhost." and "localhost" name the same host.
    let host = url
        .host_str()
        .ok_or_else(|| Error::InvalidInput("URL has no host".to_string()))?
        .to_ascii_lowercase()
        .trim_end_matches('.')
        .to_string();
    if host.is_empty() {
        return Err(Error::InvalidInput("URL has no host".to_string()));
    }
    let bare = host.trim_start_matches('[').trim_end_matches(']');

    if let Ok(ip) = bare.parse::<IpAddr>() {
        if is_internal_ip(&ip) {
            return Err(Error::InvalidInput(format!("address {} is internal", ip)));
        }
    } else if host == "localhost" || BLOCKED_HOST_SUFFIXES.iter().any(|s| host.ends_with(s)) {
        return Err(Error::InvalidInput(format!("host {} is internal", host)));
    }

    Ok(url)
}

fn is_internal_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_internal_v4(v4),
        IpAddr::V6(v6) => {
            is_internal_v6(v6) || embedded_v4(v6).is_some_and(|v4| is_internal_v4(&v4))
        }
    }
}

/// The IPv4 address carried by a mapped (`::ffff:a.b.c.d`), compatible
/// (`::a.b.c.d`) or NAT64 (`64:ff9b::/96`) IPv6 address
fn embedded_v4(ip: &Ipv6Addr) -> Option<Ipv4Addr> {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return Some(mapped);
    }
    let s = ip.segments();
    let low = Ipv4Addr::new((s[6] >> 8) as u8, s[6] as u8, (s[7] >> 8) as u8, s[7] as u8);
    match s[..6] {
        [0, 0, 0, 0, 0, 0] | [0x64, 0xff9b, 0, 0, 0, 0] => Some(low),
        _ => None,
    }
}

fn is_internal_v4(ip: &Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        // 0.0.0.0/8 "this network"
        || a == 0
        // 100.64.0.0/10 carrier-grade NAT
        || (a == 100 && (64..128).contains(&b))
}

fn is_internal_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_targets_rejected() {
        for bad in [
            "http://127.0.0.1/",
            "http://2130706433/",
            "http://169.254.169.254/latest/meta-data/",
            "http://10.0.0.5/admin",
            "http://192.168.1.1/",
            "http://100.64.0.1/",
            "http://[::1]/",
            "http://[fd00::1]/",
            "http://[::ffff:127.0.0.1]/",
            "http://localhost/",
            "http://metadata.google.internal/",
            "http://localhost./",
            "http://LOCALHOST../",
            "http://metadata.google.internal./latest",
            "http://printer.local./",
            "http://[::127.0.0.1]/",
            "http://[::a9fe:a9fe]/",
            "http://[64:ff9b::a9fe:a9fe]/",
            "http://[64:ff9b::10.0.0.1]/",
            "http://0.0.0.1/",
            "file:///etc/passwd",
            "gopher://example.com/",
            "http://example.com:6379/",
            "http://user:pw@example.com/",
            "not a url",
        ] {
            assert!(check_outbound_url(bad).is_err(), "accepted {}", bad);
        }
    }

    #[test]
    fn public_targets_allowed() {
        assert!(check_outbound_url("https://example.com/api").is_ok());
        assert!(check_outbound_url("http://93.184.216.34/").is_ok());
        assert!(check_outbound_url("https://example.com./").is_ok());
        assert!(check_outbound_url("http://[64:ff9b::5db8:d822]/").is_ok());
        let out = safe_fetch(&Invocation::new("https://example.com/x")).unwrap();
        assert_eq!(out.output, "GET https://example.com/x");
    }

    #[test]
    fn unsafe_fetch_accepts_anything() {
        let out = unsafe_fetch(&Invocation::new("http://127.0.0.1:6379/")).unwrap();
        assert!(out.side_effect.contains("127.0.0.1:6379"));
    }
}
