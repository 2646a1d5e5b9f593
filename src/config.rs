//! Application configuration loaded from the environment

use std::str::FromStr;

use thiserror::Error;

/// Errors raised while resolving configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// A variable is set but cannot be parsed
    #[error("Invalid value for {name}: '{value}'")]
    InvalidVar { name: String, value: String },
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Public base URL, used to build the OAuth redirect URI
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_pool_size: usize,
}

#[derive(Debug, Clone)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
}

impl GoogleSettings {
    /// Redirect URI registered with Google for the callback route
    pub fn redirect_uri(&self, base_url: &str) -> String {
        format!("{}/api/auth/google/callback", base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Claude is disabled when no key is configured
    pub claude_api_key: Option<String>,
    pub claude_model: String,
}

#[derive(Debug, Clone)]
pub struct ResendSettings {
    pub api_key: String,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub ttl_hours: i64,
}

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub redis_url: String,
    pub google: GoogleSettings,
    pub llm: LlmSettings,
    pub resend: ResendSettings,
    pub jwt: JwtSettings,
    pub log_level: String,
}

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_POOL_SIZE: usize = 25;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-haiku-20240307";
/// Sign-in scopes plus the Gmail access that sync, send and mark-read rely on
pub const DEFAULT_GOOGLE_SCOPES: &str = "openid email profile \
    https://www.googleapis.com/auth/gmail.readonly \
    https://www.googleapis.com/auth/gmail.send \
    https://www.googleapis.com/auth/gmail.modify";

impl AppConfig {
    /// Load configuration from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration against an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let port = vars.parsed("PORT", DEFAULT_PORT)?;
        let base_url = vars.or_default("BASE_URL", &format!("http://localhost:{}", port));

        Ok(Self {
            server: ServerConfig { port, base_url },
            database: DatabaseSettings {
                url: vars.required("DATABASE_URL")?,
                max_pool_size: vars.parsed("DATABASE_MAX_POOL_SIZE", DEFAULT_POOL_SIZE)?,
            },
            redis_url: vars.or_default("REDIS_URL", "redis://localhost:6379"),
            google: GoogleSettings {
                client_id: vars.required("GOOGLE_CLIENT_ID")?,
                client_secret: vars.required("GOOGLE_CLIENT_SECRET")?,
                scopes: vars
                    .or_default("GOOGLE_OAUTH_SCOPES", DEFAULT_GOOGLE_SCOPES)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
            },
            llm: LlmSettings {
                gemini_api_key: vars.required("GEMINI_API_KEY")?,
                gemini_model: vars.or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                claude_api_key: vars.optional("CLAUDE_API_KEY"),
                claude_model: vars.or_default("CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL),
            },
            resend: ResendSettings {
                api_key: vars.required("RESEND_API_KEY")?,
                from_email: vars.required("RESEND_FROM_EMAIL")?,
            },
            jwt: JwtSettings {
                secret: vars.required("JWT_SECRET")?,
                ttl_hours: vars.parsed("JWT_TTL_HOURS", 24)?,
            },
            log_level: vars.or_default("LOG_LEVEL", "info"),
        })
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> ([u8; 4], u16) {
        ([0, 0, 0, 0], self.server.port)
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.optional(name)
            .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
    }

    fn or_default(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, name: &str, default: T) -> Result<T, ConfigError> {
        match self.optional(name) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidVar {
                name: name.to_string(),
                value,
            }),
        }
    }
}
