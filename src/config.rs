//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// TTLs are in seconds.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Capacity of each filtered-query region
    pub filter_cache_max_entries: usize,
    pub filter_cache_ttl: u64,
    pub policy_cache_ttl: u64,
    pub policy_number_cache_ttl: u64,
    pub all_policies_cache_ttl: u64,
    pub user_cache_ttl: u64,
    pub username_cache_ttl: u64,
    pub all_users_cache_ttl: u64,
    pub users_by_role_cache_ttl: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CLEANUP_INTERVAL` - Expired-entry sweep frequency (default: 30)
    /// - `FILTER_CACHE_MAX_ENTRIES` - Filtered-query region capacity (default: 200)
    /// - `FILTER_CACHE_TTL` (600), `POLICY_CACHE_TTL` (600),
    ///   `POLICY_NUMBER_CACHE_TTL` (300), `ALL_POLICIES_CACHE_TTL` (120)
    /// - `USER_CACHE_TTL` (600), `USERNAME_CACHE_TTL` (300),
    ///   `ALL_USERS_CACHE_TTL` (120), `USERS_BY_ROLE_CACHE_TTL` (1200)
    ///
    /// Unparsable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            filter_cache_max_entries: env_or(
                "FILTER_CACHE_MAX_ENTRIES",
                defaults.filter_cache_max_entries,
            ),
            filter_cache_ttl: env_or("FILTER_CACHE_TTL", defaults.filter_cache_ttl),
            policy_cache_ttl: env_or("POLICY_CACHE_TTL", defaults.policy_cache_ttl),
            policy_number_cache_ttl: env_or(
                "POLICY_NUMBER_CACHE_TTL",
                defaults.policy_number_cache_ttl,
            ),
            all_policies_cache_ttl: env_or(
                "ALL_POLICIES_CACHE_TTL",
                defaults.all_policies_cache_ttl,
            ),
            user_cache_ttl: env_or("USER_CACHE_TTL", defaults.user_cache_ttl),
            username_cache_ttl: env_or("USERNAME_CACHE_TTL", defaults.username_cache_ttl),
            all_users_cache_ttl: env_or("ALL_USERS_CACHE_TTL", defaults.all_users_cache_ttl),
            users_by_role_cache_ttl: env_or(
                "USERS_BY_ROLE_CACHE_TTL",
                defaults.users_by_role_cache_ttl,
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            cleanup_interval: 30,
            filter_cache_max_entries: 200,
            filter_cache_ttl: 600,
            policy_cache_ttl: 600,
            policy_number_cache_ttl: 300,
            all_policies_cache_ttl: 120,
            user_cache_ttl: 600,
            username_cache_ttl: 300,
            all_users_cache_ttl: 120,
            users_by_role_cache_ttl: 1200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.cleanup_interval, 30);
        assert_eq!(config.filter_cache_max_entries, 200);
        assert_eq!(config.filter_cache_ttl, 600);
        assert_eq!(config.all_policies_cache_ttl, 120);
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("SERVER_PORT");
        env::remove_var("FILTER_CACHE_MAX_ENTRIES");
        env::remove_var("POLICY_CACHE_TTL");

        let config = Config::from_env();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.filter_cache_max_entries, 200);
        assert_eq!(config.policy_cache_ttl, 600);
    }

    #[test]
    fn test_unparsable_value_falls_back() {
        env::set_var("USERS_BY_ROLE_CACHE_TTL", "twenty minutes");
        let config = Config::from_env();
        env::remove_var("USERS_BY_ROLE_CACHE_TTL");

        assert_eq!(config.users_by_role_cache_ttl, 1200);
    }
}
