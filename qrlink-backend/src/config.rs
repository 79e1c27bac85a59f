use std::env;

#[derive(Clone)]
pub struct Config {
    pub secret_key: String,
    pub port: u16,
    pub pending_session_ttl_secs: u64,
    pub auth_session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    /// Stand-in subject for confirmations that carry no bearer token, until
    /// a real identity provider is wired in.
    pub fallback_subject: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            secret_key: env::var("SECRET_KEY").expect("SECRET_KEY must be set"),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            pending_session_ttl_secs: parse_var("PENDING_SESSION_TTL_SECS", 300),
            auth_session_ttl_secs: parse_var("AUTH_SESSION_TTL_SECS", 3600),
            sweep_interval_secs: parse_var("SWEEP_INTERVAL_SECS", 60),
            fallback_subject: env::var("LOGIN_SUBJECT").unwrap_or_else(|_| "user1".to_string()),
        }
    }
}

fn parse_var(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
