use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_url: Option<String>,
    pub google_authorize_url: String,
    pub google_token_url: String,
    pub google_userinfo_url: String,
    // When set, a finished sign-in redirects here (the portfolio page) instead of
    // answering with the account JSON.
    pub post_login_redirect: Option<String>,
    pub redis_url: Option<String>,
    pub session_ttl_seconds: u64,
    pub cookie_secure: bool,
    pub cookie_domain: Option<String>,
    pub session_key_prefix: String,

    pub blob_dir: PathBuf,
    pub blob_public_base_url: String,
    pub blob_max_bytes: usize,
}
