use crate::util::parse_bool_str;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};

const DEFAULT_API_LOG_PATH: &str = "/tmp/newsdesk-api.log";
const DEBUG_PAYLOAD_ENV: &str = "NEWSDESK_DEBUG_PAYLOAD";
const API_LOG_PATH_ENV: &str = "NEWSDESK_API_LOG_PATH";

pub fn debug_payload_enabled() -> bool {
    std::env::var(DEBUG_PAYLOAD_ENV)
        .ok()
        .and_then(|v| parse_bool_str(&v))
        .unwrap_or(false)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    let message = format!(
        "NEWSDESK_API DEBUG payload_request url={request_url}\npayload:\n{formatted_payload}\n"
    );
    emit_log_message(&message);
}

/// A single malformed frame is not fatal; record it and let the stream run.
pub fn emit_frame_parse_error(payload: &str, parse_error: &serde_json::Error) {
    let message =
        format!("NEWSDESK_API ERROR frame_parse_failed error={parse_error}\npayload:\n{payload}\n");
    emit_log_message(&message);
}

pub fn emit_frame_decode_error(line_len: usize, decode_error: &std::str::Utf8Error) {
    let message = format!(
        "NEWSDESK_API ERROR frame_decode_failed error={decode_error} line_bytes={line_len}\n"
    );
    emit_log_message(&message);
}

fn emit_log_message(message: &str) {
    if let Some(path) = resolve_log_path() {
        if append_log_file(&path, message).is_ok() {
            return;
        }
    }

    eprintln!("{message}");
}

fn resolve_log_path() -> Option<String> {
    std::env::var(API_LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            if std::io::stderr().is_terminal() {
                Some(DEFAULT_API_LOG_PATH.to_string())
            } else {
                None
            }
        })
}

fn append_log_file(path: &str, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(message.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_payload_enabled_accepts_flag_variants() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(DEBUG_PAYLOAD_ENV, "1");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "off");
        assert!(!debug_payload_enabled());
        std::env::remove_var(DEBUG_PAYLOAD_ENV);
        assert!(!debug_payload_enabled());
    }

    #[test]
    fn test_resolve_log_path_prefers_env_override() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(API_LOG_PATH_ENV, "/tmp/newsdesk-test.log");
        assert_eq!(
            resolve_log_path().as_deref(),
            Some("/tmp/newsdesk-test.log")
        );
        std::env::remove_var(API_LOG_PATH_ENV);
    }
}
