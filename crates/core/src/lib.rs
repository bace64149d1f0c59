pub mod backup;
pub mod dashboard;
pub mod domain;
pub mod ingest;
pub mod refresh;
pub mod storage;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub redis_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub alpha_vantage_api_key: Option<String>,
        pub alpha_vantage_base_url: Option<String>,
        pub news_feed_url: Option<String>,
        pub backup_snapshot_path: Option<String>,
        pub upstream_timeout_secs: u64,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                redis_url: std::env::var("REDIS_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                alpha_vantage_api_key: std::env::var("ALPHA_VANTAGE_API_KEY").ok(),
                alpha_vantage_base_url: std::env::var("ALPHA_VANTAGE_BASE_URL").ok(),
                news_feed_url: std::env::var("NEWS_FEED_URL").ok(),
                backup_snapshot_path: std::env::var("BACKUP_SNAPSHOT_PATH")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                upstream_timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(crate::ingest::alpha_vantage::DEFAULT_TIMEOUT_SECS),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_redis_url(&self) -> anyhow::Result<&str> {
            self.redis_url.as_deref().context("REDIS_URL is required")
        }

        pub fn require_alpha_vantage_api_key(&self) -> anyhow::Result<&str> {
            self.alpha_vantage_api_key
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .context("ALPHA_VANTAGE_API_KEY is required")
        }
    }

    /// Truthy env flag: "1", "true", "yes" (case-insensitive).
    pub fn env_flag(name: &str) -> bool {
        std::env::var(name)
            .map(|v| parse_flag(&v))
            .unwrap_or(false)
    }

    pub(crate) fn parse_flag(v: &str) -> bool {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        )
    }

}
