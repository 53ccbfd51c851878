//! Connection configuration for the SQL-backed stores.

use std::time::Duration;

/// Connection parameters for a MySQL or PostgreSQL server.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl DatabaseConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
        }
    }
}

/// Sizing of the connection pool shared by all workers.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of pooled connections. Should be at least the worker count.
    pub max_connections: u32,
    /// How long to wait for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

impl PoolConfig {
    /// Create a config sized for `workers` concurrent writers.
    pub fn for_workers(workers: usize) -> Self {
        let default = Self::default();
        Self {
            max_connections: default.max_connections.max(workers as u32),
            ..default
        }
    }

    /// Override the maximum number of connections.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Override the acquire timeout.
    pub fn with_acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_is_at_least_worker_count() {
        assert_eq!(PoolConfig::for_workers(1).max_connections, 5);
        assert_eq!(PoolConfig::for_workers(16).max_connections, 16);
    }
}
