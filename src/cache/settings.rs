//! Region Settings Module
//!
//! The static region-name -> (ttl, max size) table, resolved once at startup.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::Config;

// == Region Names ==
pub const POLICIES: &str = "policies";
pub const POLICY_NUMBERS: &str = "policyNumbers";
pub const ALL_POLICIES: &str = "allPolicies";
pub const FILTERED_POLICIES: &str = "filteredPolicies";

pub const USERS: &str = "users";
pub const USERNAMES: &str = "usernames";
pub const ALL_USERS: &str = "allUsers";
pub const USERS_BY_ROLE: &str = "usersByRole";

/// Expiry and capacity of a single region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSettings {
    pub ttl: Duration,
    /// None = unbounded
    pub max_entries: Option<usize>,
}

impl RegionSettings {
    pub fn new(ttl: Duration, max_entries: Option<usize>) -> Self {
        Self { ttl, max_entries }
    }

    pub fn unbounded(ttl: Duration) -> Self {
        Self::new(ttl, None)
    }
}

// == Cache Policy ==
/// Settings for every region, keyed by region name.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    regions: BTreeMap<&'static str, RegionSettings>,
}

impl CachePolicy {
    /// Builds the region table from configuration.
    pub fn from_config(config: &Config) -> Self {
        let secs = Duration::from_secs;
        let filtered_cap = Some(config.filter_cache_max_entries);

        let regions = BTreeMap::from([
            (POLICIES, RegionSettings::unbounded(secs(config.policy_cache_ttl))),
            (
                POLICY_NUMBERS,
                RegionSettings::unbounded(secs(config.policy_number_cache_ttl)),
            ),
            (
                ALL_POLICIES,
                RegionSettings::unbounded(secs(config.all_policies_cache_ttl)),
            ),
            (
                FILTERED_POLICIES,
                RegionSettings::new(secs(config.filter_cache_ttl), filtered_cap),
            ),
            (USERS, RegionSettings::unbounded(secs(config.user_cache_ttl))),
            (USERNAMES, RegionSettings::unbounded(secs(config.username_cache_ttl))),
            (ALL_USERS, RegionSettings::unbounded(secs(config.all_users_cache_ttl))),
            (
                USERS_BY_ROLE,
                RegionSettings::new(secs(config.users_by_role_cache_ttl), filtered_cap),
            ),
        ]);

        Self { regions }
    }

    /// Overrides one region, mostly useful for tests that need short TTLs.
    pub fn with_region(mut self, name: &'static str, settings: RegionSettings) -> Self {
        self.regions.insert(name, settings);
        self
    }

    /// Settings for `name`; unknown names fall back to a ten minute unbounded region.
    pub fn settings(&self, name: &str) -> RegionSettings {
        self.regions
            .get(name)
            .copied()
            .unwrap_or_else(|| RegionSettings::unbounded(Duration::from_secs(600)))
    }

    pub fn region_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.regions.keys().copied()
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
