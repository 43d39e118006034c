//! Mailbox client configuration.
//!
//! Each field resolves independently, in priority order: explicit
//! argument, then environment variable, then built-in default.

use std::env;

/// Environment variable for the mailbox base address.
pub const ENV_BASE_URL: &str = "CRUX_MAILBOX_URL";
/// Environment variable for the RPC path.
pub const ENV_PATH: &str = "CRUX_MAILBOX_PATH";
/// Environment variable for the bearer credential.
pub const ENV_TOKEN: &str = "CRUX_MAILBOX_TOKEN";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8737";
const DEFAULT_PATH: &str = "/rpc/";

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxConfig {
    /// Base address, without the RPC path.
    pub base_url: String,
    /// RPC path, normalized to start and end with `/`.
    pub path: String,
    /// Optional bearer credential.
    pub bearer_token: Option<String>,
}

/// Explicit per-field overrides. `None` falls through to the environment
/// and then the default.
#[derive(Debug, Clone, Default)]
pub struct MailboxOverrides {
    pub base_url: Option<String>,
    pub path: Option<String>,
    pub bearer_token: Option<String>,
}

impl MailboxConfig {
    /// Resolves configuration from explicit overrides, the environment,
    /// and built-in defaults, in that priority order per field.
    pub fn resolve(overrides: MailboxOverrides) -> Self {
        let base_url = overrides
            .base_url
            .or_else(|| env_non_empty(ENV_BASE_URL))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let path = overrides
            .path
            .or_else(|| env_non_empty(ENV_PATH))
            .unwrap_or_else(|| DEFAULT_PATH.to_string());
        let bearer_token = overrides.bearer_token.or_else(|| env_non_empty(ENV_TOKEN));

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            path: normalize_path(&path),
            bearer_token,
        }
    }

    /// Resolves purely from the environment and defaults.
    pub fn from_env() -> Self {
        Self::resolve(MailboxOverrides::default())
    }

    /// The full request URL.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Normalizes an RPC path to always start and end with `/`, collapsing
/// duplicate slashes.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}/", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("rpc"), "/rpc/");
        assert_eq!(normalize_path("/rpc"), "/rpc/");
        assert_eq!(normalize_path("rpc/"), "/rpc/");
        assert_eq!(normalize_path("/rpc/"), "/rpc/");
        assert_eq!(normalize_path("//rpc///v2//"), "/rpc/v2/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn test_defaults() {
        // Explicit overrides pin every field, so ambient env vars cannot
        // leak into this test.
        let config = MailboxConfig::resolve(MailboxOverrides {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            path: Some(DEFAULT_PATH.to_string()),
            bearer_token: None,
        });
        assert_eq!(config.endpoint(), "http://127.0.0.1:8737/rpc/");
    }

    #[test]
    fn test_explicit_wins_over_env() {
        // Unique variable names keep this test independent of others that
        // touch the process environment.
        unsafe {
            env::set_var(ENV_BASE_URL, "http://from-env:1111");
        }
        let config = MailboxConfig::resolve(MailboxOverrides {
            base_url: Some("http://explicit:2222/".to_string()),
            path: Some("api".to_string()),
            bearer_token: Some("tok".to_string()),
        });
        unsafe {
            env::remove_var(ENV_BASE_URL);
        }
        assert_eq!(config.base_url, "http://explicit:2222");
        assert_eq!(config.path, "/api/");
        assert_eq!(config.bearer_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_trailing_slash_collapsed_in_endpoint() {
        let config = MailboxConfig::resolve(MailboxOverrides {
            base_url: Some("http://host:9999///".to_string()),
            path: Some("//rpc//".to_string()),
            bearer_token: None,
        });
        assert_eq!(config.endpoint(), "http://host:9999/rpc/");
    }
}
