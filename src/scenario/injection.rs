// Injection scenarios
// Command, path, JSONP callback and HTML injection pairs

use super::{Invocation, Outcome, Scenario};
use crate::error::{Error, Result};
use crate::models::Category;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Hostname or dotted IPv4, no shell syntax
    static ref HOST_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9.-]{0,251}[A-Za-z0-9])?$").unwrap();

    // Plain file name inside the serving directory
    static ref FILE_NAME_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").unwrap();

    // Dotted JavaScript identifier path, at most four segments
    static ref CALLBACK_PATTERN: Regex =
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]{0,63}(?:\.[A-Za-z_$][A-Za-z0-9_$]{0,63}){0,3}$").unwrap();
}

const FILE_ROOT: &str = "/tmp/";

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "injection/command-concat",
            Category::Injection,
            "Ping a host by concatenating input into a shell command",
            unsafe_ping,
            safe_ping,
        )
        .with_sample_input("127.0.0.1; cat /etc/passwd"),
        Scenario::new(
            "injection/file-read",
            Category::Injection,
            "Read an uploaded file by name",
            unsafe_file_read,
            safe_file_read,
        )
        .with_sample_input("../../etc/passwd"),
        Scenario::new(
            "injection/jsonp-callback",
            Category::Injection,
            "Wrap a JSON payload in a caller-named JSONP callback",
            unsafe_jsonp,
            safe_jsonp,
        )
        .with_sample_input("alert(document.cookie);cb"),
        Scenario::new(
            "injection/xss-html",
            Category::Injection,
            "Greet the caller by name in an HTML fragment",
            unsafe_greeting,
            safe_greeting,
        )
        .with_sample_input("<script>alert(1)</script>"),
    ]
}

fn unsafe_ping(inv: &Invocation<'_>) -> Result<Outcome> {
    let command = format!("ping {}", inv.raw);
    Ok(Outcome::new(
        command.clone(),
        format!("would run `sh -c \"{}\"`", command),
    ))
}

fn safe_ping(inv: &Invocation<'_>) -> Result<Outcome> {
    let host = inv.raw.trim();
    if !HOST_PATTERN.is_match(host) {
        return Err(Error::InvalidInput(format!("'{}' is not a hostname", inv.raw)));
    }
    let argv = ["ping", "-c", "1", host];
    Ok(Outcome::new(
        serde_json::to_string(&argv)?,
        "would spawn ping with a fixed argv, no shell",
    ))
}

fn unsafe_file_read(inv: &Invocation<'_>) -> Result<Outcome> {
    let command = format!("cat {}{}", FILE_ROOT, inv.raw);
    Ok(Outcome::new(
        command.clone(),
        format!("would run `sh -c \"{}\"`", command),
    ))
}

fn safe_file_read(inv: &Invocation<'_>) -> Result<Outcome> {
    let name = inv.raw.trim();
    if !FILE_NAME_PATTERN.is_match(name) || name.contains("..") {
        return Err(Error::InvalidInput(format!("'{}' is not a plain file name", inv.raw)));
    }
    let path = format!("{}{}", FILE_ROOT, name);
    Ok(Outcome::new(
        path.clone(),
        format!("would open {} directly, no shell", path),
    ))
}

fn unsafe_jsonp(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::new(
        format!("{}({{'msg':'success'}})", inv.raw),
        "served without a content type",
    ))
}

fn safe_jsonp(inv: &Invocation<'_>) -> Result<Outcome> {
    let callback = inv.raw.trim();
    if !CALLBACK_PATTERN.is_match(callback) {
        return Err(Error::InvalidInput(format!("'{}' is not a callback name", inv.raw)));
    }
    let body = serde_json::json!({ "msg": "success" });
    // The leading comment defuses content-sniffing tricks on the first bytes.
    Ok(Outcome::new(
        format!("/**/{}({})", callback, body),
        "served as application/javascript with X-Content-Type-Options: nosniff",
    ))
}

fn unsafe_greeting(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::new(
        format!("<div>Welcome, {}!</div>", inv.raw),
        "served as text/html",
    ))
}

fn safe_greeting(inv: &Invocation<'_>) -> Result<Outcome> {
    Ok(Outcome::new(
        format!("<div>Welcome, {}!</div>", escape_html(inv.raw)),
        "served as text/html; charset=utf-8 with the input entity-encoded",
    ))
}

/// Entity-encode the characters that can open markup or close an attribute
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsafe_ping_keeps_shell_metacharacters() {
        let out = unsafe_ping(&Invocation::new("8.8.8.8; rm -rf /")).unwrap();
        assert_eq!(out.output, "ping 8.8.8.8; rm -rf /");
        assert!(out.side_effect.contains("sh -c"));
    }

    #[test]
    fn safe_ping_rejects_metacharacters() {
        for bad in ["8.8.8.8; id", "$(id)", "a|b", "", "-c 1000 host"] {
            assert!(
                matches!(safe_ping(&Invocation::new(bad)), Err(Error::InvalidInput(_))),
                "accepted {:?}",
                bad
            );
        }
        let out = safe_ping(&Invocation::new("example.com")).unwrap();
        assert_eq!(out.output, r#"["ping","-c","1","example.com"]"#);
    }

    #[test]
    fn safe_file_read_blocks_traversal() {
        for bad in ["../etc/passwd", "a/b", "..", "x..y", "/etc/passwd"] {
            assert!(safe_file_read(&Invocation::new(bad)).is_err(), "accepted {:?}", bad);
        }
        assert_eq!(
            safe_file_read(&Invocation::new("report.txt")).unwrap().output,
            "/tmp/report.txt"
        );
    }

    #[test]
    fn jsonp_callback_validation() {
        assert!(safe_jsonp(&Invocation::new("alert(1);cb")).is_err());
        let out = safe_jsonp(&Invocation::new("app.handlers.onData")).unwrap();
        assert_eq!(out.output, r#"/**/app.handlers.onData({"msg":"success"})"#);

        let raw = unsafe_jsonp(&Invocation::new("alert(1);cb")).unwrap();
        assert!(raw.output.starts_with("alert(1);cb("));
    }

    #[test]
    fn html_escaping() {
        assert_eq!(
            escape_html("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;&#x2F;script&gt;"
        );
        assert_eq!(escape_html("Tom & \"Jerry\""), "Tom &amp; &quot;Jerry&quot;");
        let out = safe_greeting(&Invocation::new("<b>bob</b>")).unwrap();
        assert!(!out.output.contains("<b>"));
    }
}
