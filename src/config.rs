use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Database connection URL. Without it users are kept in memory only.
    #[arg(long, env = "USERBASE_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections
    #[arg(long, env = "USERBASE_DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub db_max_connections: u32,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub users: UsersConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "USERBASE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "USERBASE_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the health endpoints
    #[arg(long, env = "USERBASE_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Seconds to wait for in-flight work after a shutdown signal
    #[arg(long, env = "USERBASE_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated CIDRs whose X-Forwarded-For header is trusted for client IP extraction
    #[arg(long, env = "USERBASE_TRUSTED_PROXIES", value_delimiter = ',')]
    pub trusted_proxies: Vec<IpNetwork>,
}

#[derive(Clone, Debug, Args)]
pub struct UsersConfig {
    /// How create responses report their outcome
    #[arg(long, env = "USERBASE_STATUS_MODE", value_enum, default_value_t = StatusMode::Legacy)]
    pub status_mode: StatusMode,

    /// Who chooses the bearer token of a newly created user
    #[arg(long, env = "USERBASE_TOKEN_POLICY", value_enum, default_value_t = TokenPolicy::Client)]
    pub token_policy: TokenPolicy,
}

/// Response semantics of the create operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusMode {
    /// 200 on success, and 200 with `{"message":"failed","status":500}` on failure.
    #[default]
    Legacy,
    /// 201 on success, 422 with field errors on failure.
    Standard,
}

/// Source of the bearer token assigned at creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TokenPolicy {
    /// Accept a client supplied token, generating one only when none is given.
    #[default]
    Client,
    /// Always generate the token on the server.
    Server,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed for authenticated endpoints
    #[arg(long = "rate-limit-per-second", env = "USERBASE_RATE_LIMIT_PER_SECOND", default_value_t = 10)]
    pub per_second: u32,

    /// Burst allowance for authenticated endpoints
    #[arg(long = "rate-limit-burst", env = "USERBASE_RATE_LIMIT_BURST", default_value_t = 20)]
    pub burst: u32,

    /// Stricter limit for unauthenticated user creation
    #[arg(long = "create-rate-limit-per-second", env = "USERBASE_CREATE_RATE_LIMIT_PER_SECOND", default_value_t = 1)]
    pub create_per_second: u32,

    /// Burst allowance for user creation
    #[arg(long = "create-rate-limit-burst", env = "USERBASE_CREATE_RATE_LIMIT_BURST", default_value_t = 3)]
    pub create_burst: u32,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the database readiness check
    #[arg(long = "health-db-timeout-ms", env = "USERBASE_HEALTH_DB_TIMEOUT_MS", default_value_t = 2000)]
    pub db_timeout_ms: u64,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "USERBASE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint (gRPC). Export is disabled when unset.
    #[arg(long, env = "USERBASE_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
