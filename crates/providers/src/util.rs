//! Shared utility functions for provider adapters.

use memoir_domain::config::AuthConfig;
use memoir_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext, warns)
/// 2. `env` field (reads environment variable)
/// 3. No key: requests go out unauthenticated
///
/// Empty values count as unset.
pub(crate) fn resolve_api_key(auth: &AuthConfig) -> Result<Option<String>> {
    if let Some(key) = auth.key.as_deref().filter(|k| !k.is_empty()) {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; prefer 'env' instead"
        );
        return Ok(Some(key.to_owned()));
    }

    if let Some(env_var) = auth.env.as_deref() {
        return match std::env::var(env_var) {
            Ok(val) if !val.is_empty() => Ok(Some(val)),
            _ => Err(Error::Auth(format!(
                "environment variable '{env_var}' not set or empty"
            ))),
        };
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_api_key_plaintext() {
        let auth = AuthConfig {
            key: Some("sk-test-123".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap().as_deref(), Some("sk-test-123"));
    }

    #[test]
    fn resolve_api_key_env_var() {
        let var_name = "MEMOIR_TEST_RESOLVE_ENV_KEY_1234";
        std::env::set_var(var_name, "env-secret-value");
        let auth = AuthConfig {
            env: Some(var_name.into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_api_key(&auth).unwrap().as_deref(),
            Some("env-secret-value")
        );
        std::env::remove_var(var_name);
    }

    #[test]
    fn resolve_api_key_env_var_missing() {
        let auth = AuthConfig {
            env: Some("MEMOIR_TEST_NONEXISTENT_VAR_8888".into()),
            ..Default::default()
        };
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(err.to_string().contains("MEMOIR_TEST_NONEXISTENT_VAR_8888"));
    }

    #[test]
    fn empty_key_counts_as_unset() {
        let auth = AuthConfig {
            key: Some(String::new()),
            ..Default::default()
        };
        assert!(resolve_api_key(&auth).unwrap().is_none());
        assert!(resolve_api_key(&AuthConfig::default()).unwrap().is_none());
    }
}
