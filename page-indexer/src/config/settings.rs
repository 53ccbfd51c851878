//! Runtime settings read from the environment.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::IndexingError;
use page_indexer_pipeline::RetryPolicy;
use page_indexer_repository::DatabaseConfig;

/// Default Kafka broker address.
const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default topic carrying crawled pages.
const DEFAULT_KAFKA_TOPIC: &str = "pages.raw";

/// Default Kafka consumer group ID.
const DEFAULT_KAFKA_GROUP_ID: &str = "ingest-consumer-group";

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default OpenSearch index holding page content.
const DEFAULT_CONTENT_INDEX: &str = "documents";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format `{}`", other)),
        }
    }
}

/// Kafka consumer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaSettings {
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
}

/// Everything the service needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    pub kafka: KafkaSettings,
    pub mysql: DatabaseConfig,
    pub postgres: DatabaseConfig,
    pub opensearch_url: String,
    pub content_index: String,
    pub workers: usize,
    pub channel_buffer_size: usize,
    pub poll_timeout: Duration,
    pub store_pool_size: u32,
    pub write_timeout: Duration,
    pub write_retry: RetryPolicy,
    pub connect_retry: RetryPolicy,
    pub metrics_log_interval: Duration,
    pub log_format: LogFormat,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KAFKA_BOOTSTRAP_SERVERS`, `KAFKA_TOPIC`, `KAFKA_GROUP_ID`
    /// - `MYSQL_HOST`, `MYSQL_PORT`, `MYSQL_USER`, `MYSQL_PASSWORD`, `MYSQL_DATABASE`
    /// - `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_USER`, `POSTGRES_PASSWORD`, `POSTGRES_DATABASE`
    /// - `OPENSEARCH_URL`, `CONTENT_INDEX`
    /// - `INGEST_WORKERS`, `CHANNEL_BUFFER_SIZE`, `POLL_TIMEOUT_MS`, `STORE_POOL_SIZE`
    /// - `STORE_WRITE_TIMEOUT_MS`, `WRITE_MAX_ATTEMPTS`, `WRITE_BASE_DELAY_MS`, `WRITE_MAX_DELAY_MS`
    /// - `CONNECT_MAX_ATTEMPTS`, `CONNECT_BASE_DELAY_MS`, `CONNECT_MAX_DELAY_MS`
    /// - `METRICS_LOG_INTERVAL_SECS`, `LOG_FORMAT`
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - Settings with defaults for every unset variable
    /// * `Err(IndexingError::ConfigError)` - If a value cannot be parsed
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Lookup(lookup);

        let workers: usize = vars.parse("INGEST_WORKERS", 1)?;
        if workers == 0 {
            return Err(IndexingError::config("INGEST_WORKERS must be at least 1"));
        }

        Ok(Self {
            kafka: KafkaSettings {
                brokers: vars.string("KAFKA_BOOTSTRAP_SERVERS", DEFAULT_KAFKA_BROKER),
                topic: vars.string("KAFKA_TOPIC", DEFAULT_KAFKA_TOPIC),
                group_id: vars.string("KAFKA_GROUP_ID", DEFAULT_KAFKA_GROUP_ID),
            },
            mysql: DatabaseConfig::new(
                vars.string("MYSQL_HOST", "localhost"),
                vars.parse("MYSQL_PORT", 3306)?,
                vars.string("MYSQL_USER", "searchuser"),
                vars.string("MYSQL_PASSWORD", "searchpass"),
                vars.string("MYSQL_DATABASE", "searchdb"),
            ),
            postgres: DatabaseConfig::new(
                vars.string("POSTGRES_HOST", "localhost"),
                vars.parse("POSTGRES_PORT", 5432)?,
                vars.string("POSTGRES_USER", "searchuser"),
                vars.string("POSTGRES_PASSWORD", "searchpass"),
                vars.string("POSTGRES_DATABASE", "indexdb"),
            ),
            opensearch_url: vars.string("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL),
            content_index: vars.string("CONTENT_INDEX", DEFAULT_CONTENT_INDEX),
            workers,
            channel_buffer_size: vars.parse("CHANNEL_BUFFER_SIZE", 100)?,
            poll_timeout: Duration::from_millis(vars.parse("POLL_TIMEOUT_MS", 1000)?),
            store_pool_size: vars.parse("STORE_POOL_SIZE", (workers as u32).max(5))?,
            write_timeout: Duration::from_millis(vars.parse("STORE_WRITE_TIMEOUT_MS", 10_000)?),
            write_retry: RetryPolicy::new(
                vars.parse("WRITE_MAX_ATTEMPTS", 4)?,
                Duration::from_millis(vars.parse("WRITE_BASE_DELAY_MS", 100)?),
                Duration::from_millis(vars.parse("WRITE_MAX_DELAY_MS", 5000)?),
            ),
            connect_retry: RetryPolicy::new(
                vars.parse("CONNECT_MAX_ATTEMPTS", 10)?,
                Duration::from_millis(vars.parse("CONNECT_BASE_DELAY_MS", 1000)?),
                Duration::from_millis(vars.parse("CONNECT_MAX_DELAY_MS", 5000)?),
            ),
            metrics_log_interval: Duration::from_secs(
                vars.parse("METRICS_LOG_INTERVAL_SECS", 60)?,
            ),
            log_format: vars.parse("LOG_FORMAT", LogFormat::Json)?,
        })
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, IndexingError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|e| IndexingError::config(format!("invalid {} `{}`: {}", key, raw, e))),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, IndexingError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();

        assert_eq!(settings.kafka.brokers, "localhost:9092");
        assert_eq!(settings.kafka.topic, "pages.raw");
        assert_eq!(settings.kafka.group_id, "ingest-consumer-group");
        assert_eq!(settings.mysql.port, 3306);
        assert_eq!(settings.mysql.database, "searchdb");
        assert_eq!(settings.postgres.port, 5432);
        assert_eq!(settings.postgres.database, "indexdb");
        assert_eq!(settings.content_index, "documents");
        assert_eq!(settings.workers, 1);
        assert_eq!(settings.store_pool_size, 5);
        assert_eq!(settings.poll_timeout, Duration::from_secs(1));
        assert_eq!(settings.write_timeout, Duration::from_secs(10));
        assert_eq!(settings.write_retry, RetryPolicy::default());
        assert_eq!(settings.connect_retry.max_attempts, 10);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("KAFKA_BOOTSTRAP_SERVERS", "kafka:29092"),
            ("INGEST_WORKERS", "8"),
            ("POSTGRES_HOST", "pg"),
            ("WRITE_MAX_ATTEMPTS", "2"),
            ("LOG_FORMAT", "Pretty"),
        ])
        .unwrap();

        assert_eq!(settings.kafka.brokers, "kafka:29092");
        assert_eq!(settings.workers, 8);
        assert_eq!(settings.store_pool_size, 8);
        assert_eq!(settings.postgres.host, "pg");
        assert_eq!(settings.write_retry.max_attempts, 2);
        assert_eq!(settings.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_blank_value_falls_back_to_default() {
        let settings = settings(&[("KAFKA_TOPIC", "  "), ("MYSQL_PORT", "")]).unwrap();

        assert_eq!(settings.kafka.topic, "pages.raw");
        assert_eq!(settings.mysql.port, 3306);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = settings(&[("MYSQL_PORT", "not-a-port")]).unwrap_err();

        assert!(matches!(err, IndexingError::ConfigError(_)));
        assert!(err.to_string().contains("MYSQL_PORT"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(settings(&[("INGEST_WORKERS", "0")]).is_err());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        assert!(settings(&[("LOG_FORMAT", "xml")]).is_err());
    }
}
