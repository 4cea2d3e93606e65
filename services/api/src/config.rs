/// API service configuration loaded from environment variables.
#[derive(Debug)]
pub struct ApiConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3000). Env var: `API_PORT`.
    pub api_port: u16,
    pub tokens: TokenSettings,
}

/// Signing secrets and lifetimes for issued JWTs.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// Secret for access and customer tokens. Env var: `JWT_SECRET`.
    pub access_secret: String,
    /// Secret for refresh tokens. Env var: `JWT_REFRESH_SECRET`, defaults to `JWT_SECRET`.
    pub refresh_secret: String,
    /// Staff access-token lifetime in seconds (default 3600).
    pub access_ttl_secs: i64,
    /// Refresh-token and session lifetime in seconds (default 7 days).
    pub refresh_ttl_secs: i64,
    /// Customer-token lifetime in seconds (default 30 days).
    pub customer_ttl_secs: i64,
}

pub const DEFAULT_ACCESS_TTL_SECS: i64 = 3600;
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 3600;
pub const DEFAULT_CUSTOMER_TTL_SECS: i64 = 30 * 24 * 3600;

impl TokenSettings {
    /// Same secret for every token kind and default lifetimes.
    pub fn with_secret(secret: &str) -> Self {
        Self {
            access_secret: secret.to_owned(),
            refresh_secret: secret.to_owned(),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            customer_ttl_secs: DEFAULT_CUSTOMER_TTL_SECS,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let access_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET");
        let refresh_secret =
            std::env::var("JWT_REFRESH_SECRET").unwrap_or_else(|_| access_secret.clone());
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            api_port: env_or("API_PORT", 3000),
            tokens: TokenSettings {
                access_secret,
                refresh_secret,
                access_ttl_secs: env_or("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TTL_SECS),
                refresh_ttl_secs: env_or("REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TTL_SECS),
                customer_ttl_secs: env_or("CUSTOMER_TOKEN_TTL_SECS", DEFAULT_CUSTOMER_TTL_SECS),
            },
        }
    }
}
