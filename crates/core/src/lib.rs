pub mod domain;
pub mod projection;
pub mod service;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;

    use crate::projection::ExpandOptions;
    use crate::time::calendar::DEFAULT_HORIZON_MONTHS;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub port: u16,
        pub db_max_connections: u32,
        /// Look-ahead for recurrence expansion. Defaults to one year.
        pub horizon_months: u32,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let horizon_months = match std::env::var("BUDGET_HORIZON_MONTHS") {
                Ok(s) => s
                    .trim()
                    .parse::<u32>()
                    .with_context(|| format!("BUDGET_HORIZON_MONTHS must be an integer (got {s:?})"))?,
                Err(_) => DEFAULT_HORIZON_MONTHS,
            };
            anyhow::ensure!(
                (1..=120).contains(&horizon_months),
                "BUDGET_HORIZON_MONTHS must be 1..=120 (got {horizon_months})"
            );

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                port: std::env::var("PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3000),
                db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
                horizon_months,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn expand_options(&self) -> ExpandOptions {
            ExpandOptions {
                horizon_months: self.horizon_months,
            }
        }
    }
}
