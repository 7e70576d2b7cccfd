//! Token resolution and masking for upload credentials
//!
//! Tokens are read from the environment at the moment they are needed and
//! wrapped in `SecretString` so they never show up in debug output. Anything
//! printed or stored goes through the masking helpers first.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::env;

/// Resolves the upload token from a configured environment variable
#[derive(Debug, Clone)]
pub struct SecureTokenManager {
    env_var: String,
}

impl SecureTokenManager {
    /// Create a token manager reading from the given environment variable.
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    /// Environment variable this manager reads.
    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Resolve the token from the environment, if set and non-empty.
    pub fn resolve(&self) -> Option<SecretString> {
        match env::var(&self.env_var) {
            Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value)),
            _ => None,
        }
    }

    /// Replace any occurrence of the token in `text` with its masked form.
    ///
    /// Used before storing command output in reports, so a tool that echoes
    /// its credentials back never leaks them.
    pub fn mask_in_string(&self, text: &str) -> String {
        match self.resolve() {
            Some(token) => {
                let raw = token.expose_secret();
                if raw.is_empty() {
                    return text.to_string();
                }
                let pattern = Regex::new(&regex::escape(raw)).expect("escaped pattern is valid");
                pattern.replace_all(text, mask_token(raw)).into_owned()
            }
            None => text.to_string(),
        }
    }
}

/// Mask a token for display: `pypi-AgEIcH...3xYz` style.
///
/// # Examples
///
/// ```
/// use release_publisher::security::token_manager::mask_token;
///
/// assert_eq!(mask_token("short"), "****");
/// assert_eq!(mask_token("pypi-AgEIcHlwaS5vcmc3xYz"), "pyp...xYz");
/// ```
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 10 {
        "****".to_string()
    } else {
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 3..].iter().collect();
        format!("{head}...{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_present() {
        unsafe {
            env::set_var("TEST_PUBLISH_TOKEN_PRESENT", "pypi-AgEIcHlwaS5vcmc");
        }
        let manager = SecureTokenManager::new("TEST_PUBLISH_TOKEN_PRESENT");
        let token = manager.resolve().unwrap();
        assert_eq!(token.expose_secret(), "pypi-AgEIcHlwaS5vcmc");
        unsafe {
            env::remove_var("TEST_PUBLISH_TOKEN_PRESENT");
        }
    }

    #[test]
    fn test_resolve_missing() {
        let manager = SecureTokenManager::new("TEST_PUBLISH_TOKEN_UNSET");
        assert!(manager.resolve().is_none());
    }

    #[test]
    fn test_resolve_empty_is_missing() {
        unsafe {
            env::set_var("TEST_PUBLISH_TOKEN_EMPTY", "   ");
        }
        let manager = SecureTokenManager::new("TEST_PUBLISH_TOKEN_EMPTY");
        assert!(manager.resolve().is_none());
        unsafe {
            env::remove_var("TEST_PUBLISH_TOKEN_EMPTY");
        }
    }

    #[test]
    fn test_mask_token_short() {
        assert_eq!(mask_token("abc"), "****");
        assert_eq!(mask_token("123456789"), "****");
    }

    #[test]
    fn test_mask_token_long() {
        assert_eq!(mask_token("pypi-AgEIcHlwaS5vcmc"), "pyp...cmc");
    }

    #[test]
    fn test_mask_token_multibyte() {
        // Masking counts characters, not bytes
        assert_eq!(mask_token("ααααααα"), "****");
        assert_eq!(mask_token("αβγδεζηθικ"), "αβγ...θικ");
        assert_eq!(mask_token("ポケットトークン認証済み"), "ポケッ...証済み");
    }

    #[test]
    fn test_mask_in_string() {
        unsafe {
            env::set_var("TEST_PUBLISH_TOKEN_MASK", "pypi-AgEIcHlwaS5vcmc");
        }
        let manager = SecureTokenManager::new("TEST_PUBLISH_TOKEN_MASK");
        let masked = manager.mask_in_string("uploading with pypi-AgEIcHlwaS5vcmc done");
        assert!(!masked.contains("pypi-AgEIcHlwaS5vcmc"));
        assert!(masked.contains("pyp..."));
        unsafe {
            env::remove_var("TEST_PUBLISH_TOKEN_MASK");
        }
    }
}
