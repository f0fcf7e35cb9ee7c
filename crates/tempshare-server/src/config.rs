use std::net::SocketAddr;

use chrono::Duration;
use tempshare_core::expiry::DEFAULT_TTL_HOURS;
use tempshare_core::validation::DEFAULT_MAX_FILE_SIZE_MB;
use tempshare_db::DbConfig;
use tempshare_service::ServiceConfig;
use tempshare_store::remote::DEFAULT_TRUSTED_SUFFIX;

/// Files accepted in one multipart request before the body limit applies.
const FILES_PER_REQUEST: u64 = 8;

/// Server settings. Every flag also reads from its environment variable.
#[derive(Debug, Clone, clap::Args)]
pub struct ServerConfig {
    #[arg(long, env = "TEMPSHARE_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    #[arg(long, env = "TEMPSHARE_PORT", default_value_t = 3720)]
    pub port: u16,

    /// Postgres URL. SQLite is used when unset.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "TEMPSHARE_SQLITE_PATH")]
    pub sqlite_path: Option<String>,

    /// Bearer secret for the cleanup endpoint. Without it the endpoint
    /// refuses every request.
    #[arg(long, env = "CRON_SECRET", hide_env_values = true)]
    pub cron_secret: Option<String>,

    /// Signing secret for client-direct upload tokens.
    #[arg(long, env = "TEMPSHARE_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: Option<String>,

    #[arg(long, env = "TEMPSHARE_MAX_FILE_MB", default_value_t = DEFAULT_MAX_FILE_SIZE_MB)]
    pub max_file_mb: u64,

    #[arg(long, env = "TEMPSHARE_TTL_HOURS", default_value_t = DEFAULT_TTL_HOURS)]
    pub ttl_hours: i64,

    /// Hostname suffix external blob URLs must end with.
    #[arg(long, env = "TEMPSHARE_TRUSTED_BLOB_SUFFIX", default_value = DEFAULT_TRUSTED_SUFFIX)]
    pub trusted_blob_suffix: String,

    /// Run the sweep in-process every N seconds. Off by default.
    #[arg(long, env = "TEMPSHARE_SWEEP_INTERVAL_SECS")]
    pub sweep_interval_secs: Option<u64>,
}

impl ServerConfig {
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(SocketAddr::new(self.bind.parse()?, self.port))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            database_url: self.database_url.clone(),
            sqlite_path: self.sqlite_path.clone(),
        }
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_file_mb: self.max_file_mb,
            ttl: Duration::hours(self.ttl_hours),
            token_secret: self.token_secret.clone().filter(|s| !s.is_empty()),
            ..ServiceConfig::default()
        }
    }
}

/// Request body limit for multipart uploads: a full batch plus slack for
/// multipart framing.
pub fn body_limit(max_file_mb: u64) -> usize {
    let bytes = max_file_mb
        .saturating_mul(1024 * 1024)
        .saturating_mul(FILES_PER_REQUEST)
        .saturating_add(1024 * 1024);
    usize::try_from(bytes).unwrap_or(usize::MAX)
}
