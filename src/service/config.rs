use std::{env, path::PathBuf, sync::Arc};

use crate::config::Config;

const DEFAULT_BLOB_MAX_BYTES: usize = 5 * 1024 * 1024;

pub trait ConfigService: Send + Sync {
    fn port(&self) -> u16;
    fn values(&self) -> &Config;
}

pub struct ConfigServiceImpl {
    config: Arc<Config>,
}

impl ConfigServiceImpl {
    fn strip_wrapping_quotes(value: &str) -> &str {
        if value.len() >= 2 {
            let bytes = value.as_bytes();
            let first = bytes[0];
            let last = bytes[value.len() - 1];
            if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
                return &value[1..value.len() - 1];
            }
        }
        value
    }

    fn normalize(value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let normalized = Self::strip_wrapping_quotes(trimmed).trim();
        if normalized.is_empty() {
            None
        } else {
            Some(normalized.to_string())
        }
    }

    fn env_nonempty(key: &str) -> Option<String> {
        env::var(key).ok().and_then(|value| Self::normalize(&value))
    }

    fn env_u16(key: &str) -> Option<u16> {
        Self::env_nonempty(key).and_then(|value| value.parse::<u16>().ok())
    }

    fn env_u64(key: &str) -> Option<u64> {
        Self::env_nonempty(key).and_then(|value| value.parse::<u64>().ok())
    }

    fn env_usize(key: &str) -> Option<usize> {
        Self::env_nonempty(key).and_then(|value| value.parse::<usize>().ok())
    }

    fn parse_bool(value: &str) -> bool {
        value == "1" || value.eq_ignore_ascii_case("true")
    }

    fn env_bool(key: &str, default: bool) -> bool {
        Self::env_nonempty(key)
            .map(|value| Self::parse_bool(&value))
            .unwrap_or(default)
    }

    pub fn new() -> Self {
        let port = Self::env_u16("PORT").unwrap_or(3333);
        let google_client_id = Self::env_nonempty("AUTH_GOOGLE_CLIENT_ID");
        let google_client_secret = Self::env_nonempty("AUTH_GOOGLE_CLIENT_SECRET");
        let google_redirect_url = Self::env_nonempty("AUTH_GOOGLE_REDIRECT_URL");
        let google_mock_enabled = Self::env_bool("AUTH_GOOGLE_MOCK_ENABLED", false);
        let google_authorize_url =
            Self::env_nonempty("AUTH_GOOGLE_AUTHORIZE_URL").unwrap_or_else(|| {
                if google_mock_enabled {
                    "http://localhost:3333/__google_mock__/o/oauth2/v2/auth".to_string()
                } else {
                    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
                }
            });
        let google_token_url = Self::env_nonempty("AUTH_GOOGLE_TOKEN_URL").unwrap_or_else(|| {
            if google_mock_enabled {
                "http://google-mock/token".to_string()
            } else {
                "https://oauth2.googleapis.com/token".to_string()
            }
        });
        let google_userinfo_url =
            Self::env_nonempty("AUTH_GOOGLE_USERINFO_URL").unwrap_or_else(|| {
                if google_mock_enabled {
                    "http://google-mock/oauth2/v3/userinfo".to_string()
                } else {
                    "https://openidconnect.googleapis.com/v1/userinfo".to_string()
                }
            });
        let post_login_redirect = Self::env_nonempty("AUTH_POST_LOGIN_REDIRECT");
        let redis_url = Self::env_nonempty("REDIS_URL");
        let session_ttl_seconds = Self::env_u64("SESSION_TTL_SECONDS").unwrap_or(60 * 60 * 24 * 7);
        let cookie_secure = Self::env_bool("COOKIE_SECURE", false);
        let cookie_domain = Self::env_nonempty("COOKIE_DOMAIN");
        let session_key_prefix =
            Self::env_nonempty("SESSION_KEY_PREFIX").unwrap_or_else(|| "portfolio-api".to_string());

        let blob_dir = Self::env_nonempty("BLOB_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/blobs"));
        let blob_public_base_url = Self::env_nonempty("BLOB_PUBLIC_BASE_URL")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "/blobs".to_string());
        let blob_max_bytes = Self::env_usize("BLOB_MAX_BYTES").unwrap_or(DEFAULT_BLOB_MAX_BYTES);

        Self {
            config: Arc::new(Config {
                port,
                google_client_id,
                google_client_secret,
                google_redirect_url,
                google_authorize_url,
                google_token_url,
                google_userinfo_url,
                post_login_redirect,
                redis_url,
                session_ttl_seconds,
                cookie_secure,
                cookie_domain,
                session_key_prefix,
                blob_dir,
                blob_public_base_url,
                blob_max_bytes,
            }),
        }
    }

    #[cfg(test)]
    pub fn from_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl ConfigService for ConfigServiceImpl {
    fn port(&self) -> u16 {
        self.config.port
    }

    fn values(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_quotes_and_whitespace() {
        assert_eq!(
            ConfigServiceImpl::normalize("  \"secret\" "),
            Some("secret".to_string())
        );
        assert_eq!(
            ConfigServiceImpl::normalize("'abc'"),
            Some("abc".to_string())
        );
        assert_eq!(ConfigServiceImpl::normalize("\"\""), None);
        assert_eq!(ConfigServiceImpl::normalize("   "), None);
        assert_eq!(ConfigServiceImpl::normalize("\""), Some("\"".to_string()));
    }

    #[test]
    fn parse_bool_accepts_one_and_true() {
        assert!(ConfigServiceImpl::parse_bool("1"));
        assert!(ConfigServiceImpl::parse_bool("TRUE"));
        assert!(!ConfigServiceImpl::parse_bool("yes"));
        assert!(!ConfigServiceImpl::parse_bool("0"));
    }
}
