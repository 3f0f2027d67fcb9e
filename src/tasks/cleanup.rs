//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries from every cache
//! region. Reads check expiry on their own, so the sweep only reclaims memory.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::AppState;

/// Spawns a background task that periodically removes expired cache entries.
///
/// Returns the task handle so it can be aborted during graceful shutdown.
pub fn spawn_cleanup_task(state: AppState, cleanup_interval_secs: u64) -> JoinHandle<()> {
    // tokio::time::interval panics on a zero period
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = state.cleanup_expired();
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::settings::POLICIES;
    use crate::cache::{CachePolicy, RegionSettings};
    use crate::models::{AutoPolicyType, PolicyDto, PolicyStatus};
    use crate::service::{PolicyService, UserService};
    use crate::store::{MemoryPolicyStore, MemoryUserStore};
    use std::sync::Arc;

    fn state_with_policy_ttl(ttl: Duration) -> AppState {
        let cache_policy =
            CachePolicy::default().with_region(POLICIES, RegionSettings::unbounded(ttl));
        AppState::new(
            PolicyService::new(Arc::new(MemoryPolicyStore::new()), &cache_policy),
            UserService::new(Arc::new(MemoryUserStore::new()), &cache_policy),
        )
    }

    fn cache_one_policy(state: &AppState) -> u64 {
        let created = state
            .policies
            .create_policy(PolicyDto {
                policy_number: Some("AP-1".to_string()),
                status: Some(PolicyStatus::Active),
                policy_type: Some(AutoPolicyType::Liability),
                user_id: Some(1),
                ..Default::default()
            })
            .unwrap();
        let id = created.id.unwrap();
        state.policies.get_policy_by_id(id).unwrap();
        id
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let state = state_with_policy_ttl(Duration::from_millis(200));
        cache_one_policy(&state);
        assert_eq!(state.policies.caches().by_id.len(), 1);

        let handle = spawn_cleanup_task(state.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(state.policies.caches().by_id.len(), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let state = state_with_policy_ttl(Duration::from_secs(3600));
        let id = cache_one_policy(&state);

        let handle = spawn_cleanup_task(state.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(state.policies.caches().by_id.get(&id).is_some());
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let state = AppState::from_config(&crate::config::Config::default());
        let handle = spawn_cleanup_task(state, 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
