//! Console hygiene for model output and error text: ANSI stripping, secret
//! redaction and preview truncation.

use regex::Regex;
use std::sync::OnceLock;

const PREVIEW_LEN_ENV: &str = "AGENTCHAIN_PREVIEW_LEN";
const ALLOW_RAW_ENV: &str = "AGENTCHAIN_ALLOW_RAW_OUTPUT";
const DEFAULT_PREVIEW_LEN: usize = 4000;

pub fn preview_len() -> usize {
    std::env::var(PREVIEW_LEN_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PREVIEW_LEN)
}

pub fn allow_raw_output() -> bool {
    std::env::var(ALLOW_RAW_ENV)
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Remove ANSI CSI sequences (`ESC [ ... final`).
pub fn strip_ansi(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'[') {
            i += 2;
            while i < bytes.len() {
                let b = bytes[i];
                i += 1;
                if (0x40..=0x7e).contains(&b) {
                    break;
                }
            }
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

pub fn sanitize_for_console(input: &str) -> String {
    if allow_raw_output() {
        return input.to_string();
    }
    redact(&strip_ansi(input))
}

pub fn sanitize_preview_for_console(input: &str) -> String {
    truncate_chars(&sanitize_for_console(input), preview_len())
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        return s.to_string();
    }

    let truncated: String = s.chars().take(max_chars).collect();
    format!("{truncated}... [truncated {} chars]", count - max_chars)
}

fn rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        let rule = |pattern: &str, replacement: &'static str| {
            Regex::new(pattern)
                .map(|re| (re, replacement))
                .map_err(|e| log::error!("invalid redaction pattern {pattern}: {e}"))
                .ok()
        };
        [
            rule(
                r"(?s)-----BEGIN (?:RSA )?PRIVATE KEY-----.*?-----END (?:RSA )?PRIVATE KEY-----",
                "[REDACTED PRIVATE KEY]",
            ),
            rule(r"(https?://)([^/\s:@]+):([^/\s@]+)@", "$1$2:[REDACTED]@"),
            // Bedrock API keys
            rule(r"\bABSK[A-Za-z0-9+/=]{16,}", "ABSK[REDACTED]"),
            // AWS access key ids
            rule(r"\b(AKIA|ASIA)[A-Z0-9]{16}\b", "$1[REDACTED]"),
            rule(r"(?i)\b(bearer)\s+[A-Za-z0-9._~+/=\-]{8,}", "$1 [REDACTED]"),
            rule(
                r#"(?i)(api[_-]?key|authorization|access[_-]?token|secret[_-]?access[_-]?key|session[_-]?token|token|secret|password)\s*([:=]\s*)(["']?)([^\s"'\r\n,}]+)(["']?)"#,
                "$1$2$3[REDACTED]$5",
            ),
        ]
        .into_iter()
        .flatten()
        .collect()
    })
}

fn redact(input: &str) -> String {
    let mut s = input.to_string();
    for (re, replacement) in rules() {
        s = re.replace_all(&s, *replacement).into_owned();
    }
    s
}
