//! Service-level tests
//!
//! Drive the query services against a store wrapper that counts calls and can
//! be switched into a failing state.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use policy_cache::cache::settings::{ALL_POLICIES, FILTERED_POLICIES, POLICIES};
use policy_cache::cache::{CachePolicy, RegionSettings};
use policy_cache::error::AppError;
use policy_cache::models::{AutoPolicy, AutoPolicyType, PolicyDto, PolicyFilter, PolicyStatus};
use policy_cache::service::PolicyService;
use policy_cache::store::{MemoryPolicyStore, PolicyStore, StoreError, StoreResult};

// == Counting Store ==
#[derive(Default)]
struct CountingStore {
    inner: MemoryPolicyStore,
    find_by_id: AtomicUsize,
    find_all: AtomicUsize,
    find_filtered: AtomicUsize,
    failing: AtomicBool,
}

impl CountingStore {
    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl PolicyStore for CountingStore {
    fn find_by_id(&self, id: u64) -> StoreResult<Option<AutoPolicy>> {
        self.find_by_id.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.find_by_id(id)
    }

    fn find_by_policy_number(&self, policy_number: &str) -> StoreResult<Option<AutoPolicy>> {
        self.check()?;
        self.inner.find_by_policy_number(policy_number)
    }

    fn find_all(&self) -> StoreResult<Vec<AutoPolicy>> {
        self.find_all.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.find_all()
    }

    fn find_filtered(&self, filter: &PolicyFilter) -> StoreResult<Vec<AutoPolicy>> {
        self.find_filtered.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.find_filtered(filter)
    }

    fn save(&self, policy: AutoPolicy) -> StoreResult<AutoPolicy> {
        self.check()?;
        self.inner.save(policy)
    }

    fn save_all(&self, policies: Vec<AutoPolicy>) -> StoreResult<Vec<AutoPolicy>> {
        self.check()?;
        self.inner.save_all(policies)
    }

    fn exists_by_id(&self, id: u64) -> StoreResult<bool> {
        self.check()?;
        self.inner.exists_by_id(id)
    }

    fn delete_by_id(&self, id: u64) -> StoreResult<()> {
        self.check()?;
        self.inner.delete_by_id(id)
    }
}

fn setup_with(policy: CachePolicy) -> (Arc<CountingStore>, PolicyService) {
    let store = Arc::new(CountingStore::default());
    let service = PolicyService::new(store.clone(), &policy);
    (store, service)
}

fn setup() -> (Arc<CountingStore>, PolicyService) {
    setup_with(CachePolicy::default())
}

fn policy(number: &str, make: &str, status: PolicyStatus) -> PolicyDto {
    PolicyDto {
        policy_number: Some(number.to_string()),
        status: Some(status),
        policy_type: Some(AutoPolicyType::Comprehensive),
        vehicle_make: Some(make.to_string()),
        vehicle_model: Some("Model".to_string()),
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        premium_amount: Some(850.0),
        user_id: Some(1),
        ..Default::default()
    }
}

fn active_toyota() -> PolicyFilter {
    PolicyFilter {
        status: Some(PolicyStatus::Active),
        vehicle_make: Some("Toyota".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_filtered_query_cached_until_create() {
    let (store, service) = setup();
    for (i, make) in ["Toyota", "Toyota", "Toyota", "Honda"].iter().enumerate() {
        assert_ok!(service.create_policy(policy(&format!("AP-{}", i), make, PolicyStatus::Active)));
    }
    assert_ok!(service.create_policy(policy("AP-X", "Toyota", PolicyStatus::Cancelled)));

    let first = service.get_filtered_policies(&active_toyota()).unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(store.find_filtered.load(Ordering::SeqCst), 1);

    let second = service.get_filtered_policies(&active_toyota()).unwrap();
    assert_eq!(second, first);
    assert_eq!(store.find_filtered.load(Ordering::SeqCst), 1);

    assert_ok!(service.create_policy(policy("AP-9", "Toyota", PolicyStatus::Active)));
    assert!(service.caches().filtered.is_empty());

    let third = service.get_filtered_policies(&active_toyota()).unwrap();
    assert_eq!(third.len(), 4);
    assert_eq!(store.find_filtered.load(Ordering::SeqCst), 2);
}

#[test]
fn test_distinct_filters_cached_separately() {
    let (store, service) = setup();
    assert_ok!(service.create_policy(policy("AP-1", "Toyota", PolicyStatus::Active)));

    let lower = PolicyFilter {
        vehicle_make: Some("toyota".to_string()),
        ..Default::default()
    };
    assert_eq!(service.get_filtered_policies(&active_toyota()).unwrap().len(), 1);
    assert_eq!(service.get_filtered_policies(&lower).unwrap().len(), 1);

    assert_eq!(store.find_filtered.load(Ordering::SeqCst), 2);
    assert_eq!(service.caches().filtered.len(), 2);
}

#[test]
fn test_update_writes_through_and_evicts_list() {
    let (store, service) = setup();
    for i in 1..=7 {
        assert_ok!(service.create_policy(policy(&format!("AP-{}", i), "Ford", PolicyStatus::Active)));
    }
    assert_ok!(service.get_policy_by_id(7));
    assert_eq!(service.get_all_policies().unwrap().len(), 7);
    let lookups = store.find_by_id.load(Ordering::SeqCst);
    assert_eq!(store.find_all.load(Ordering::SeqCst), 1);

    let mut changes = policy("AP-7", "Subaru", PolicyStatus::Active);
    changes.premium_amount = Some(990.0);
    let updated = service.update_policy(7, changes).unwrap();

    let cached = service.caches().by_id.get(&7).unwrap();
    assert_eq!(cached, updated);
    assert_eq!(cached.vehicle_make.as_deref(), Some("Subaru"));
    assert!(service.caches().all.is_empty());

    assert_eq!(service.get_policy_by_id(7).unwrap().premium_amount, Some(990.0));
    assert_eq!(store.find_by_id.load(Ordering::SeqCst), lookups);

    let all = service.get_all_policies().unwrap();
    assert_eq!(store.find_all.load(Ordering::SeqCst), 2);
    assert!(all.iter().any(|p| p.vehicle_make.as_deref() == Some("Subaru")));
}

#[test]
fn test_absence_is_not_cached() {
    let (store, service) = setup();

    assert!(matches!(service.get_policy_by_id(1), Err(AppError::NotFound(_))));
    assert!(matches!(
        service.get_policy_by_number("AP-1"),
        Err(AppError::NotFound(_))
    ));
    assert!(service.caches().by_id.is_empty());

    let created = service
        .create_policy(policy("AP-1", "Kia", PolicyStatus::Active))
        .unwrap();

    assert_eq!(service.get_policy_by_id(1).unwrap(), created);
    assert_eq!(service.get_policy_by_number("AP-1").unwrap(), created);
    assert_eq!(store.find_by_id.load(Ordering::SeqCst), 2);
}

#[test]
fn test_transient_failure_is_not_cached() {
    let (store, service) = setup();
    assert_ok!(service.create_policy(policy("AP-1", "Kia", PolicyStatus::Active)));

    store.set_failing(true);
    let err = assert_err!(service.get_all_policies());
    assert!(matches!(err, AppError::TransientStore(_)));
    assert!(service.caches().all.is_empty());

    store.set_failing(false);
    assert_eq!(service.get_all_policies().unwrap().len(), 1);

    let stats = service.cache_stats();
    assert_eq!(stats[ALL_POLICIES].load_failures, 1);
    assert_eq!(stats[ALL_POLICIES].load_successes, 1);
}

#[test]
fn test_failed_write_leaves_cache_intact() {
    let (store, service) = setup();
    assert_ok!(service.create_policy(policy("AP-1", "Kia", PolicyStatus::Active)));
    assert_ok!(service.get_all_policies());

    store.set_failing(true);
    assert_err!(service.create_policy(policy("AP-2", "Kia", PolicyStatus::Active)));
    store.set_failing(false);

    assert_eq!(service.caches().all.len(), 1);
    assert_eq!(service.get_all_policies().unwrap().len(), 1);
    assert_eq!(store.find_all.load(Ordering::SeqCst), 1);
}

#[test]
fn test_delete_evicts_point_entry() {
    let (_store, service) = setup();
    let created = service
        .create_policy(policy("AP-1", "Kia", PolicyStatus::Active))
        .unwrap();
    let id = created.id.unwrap();
    assert_ok!(service.get_policy_by_id(id));
    assert_ok!(service.get_policy_by_number("AP-1"));

    assert_ok!(service.delete_policy(id));

    assert!(service.caches().by_id.get(&id).is_none());
    assert!(service.caches().by_key.is_empty());
    assert!(matches!(service.get_policy_by_id(id), Err(AppError::NotFound(_))));
}

#[test]
fn test_entries_expire_after_ttl() {
    let short = RegionSettings::unbounded(Duration::from_millis(50));
    let (store, service) = setup_with(CachePolicy::default().with_region(POLICIES, short));
    let id = service
        .create_policy(policy("AP-1", "Kia", PolicyStatus::Active))
        .unwrap()
        .id
        .unwrap();

    assert_ok!(service.get_policy_by_id(id));
    assert_ok!(service.get_policy_by_id(id));
    assert_eq!(store.find_by_id.load(Ordering::SeqCst), 1);

    thread::sleep(Duration::from_millis(80));

    assert_ok!(service.get_policy_by_id(id));
    assert_eq!(store.find_by_id.load(Ordering::SeqCst), 2);
}

#[test]
fn test_filtered_region_is_bounded() {
    let capped = RegionSettings::new(Duration::from_secs(600), Some(3));
    let (_store, service) = setup_with(CachePolicy::default().with_region(FILTERED_POLICIES, capped));

    for user_id in 0..10 {
        let filter = PolicyFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        assert_ok!(service.get_filtered_policies(&filter));
        assert!(service.caches().filtered.len() <= 3);
    }
    assert_eq!(service.cache_stats()[FILTERED_POLICIES].evictions, 7);
}

#[test]
fn test_concurrent_readers_and_writers() {
    let (_store, service) = setup();
    let service = Arc::new(service);
    let id = service
        .create_policy(policy("AP-0", "Kia", PolicyStatus::Active))
        .unwrap()
        .id
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for i in 0..25 {
                    if t % 2 == 0 {
                        let number = format!("AP-{}-{}", t, i);
                        assert_ok!(service.create_policy(policy(&number, "Kia", PolicyStatus::Active)));
                    } else {
                        assert_ok!(service.get_policy_by_id(id));
                        assert_ok!(service.get_all_policies());
                        assert_ok!(service.get_filtered_policies(&active_toyota()));
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // every create cleared the list region, so the next read sees all of them
    assert_eq!(service.get_all_policies().unwrap().len(), 1 + 4 * 25);
}

// == Slow Save Store ==
/// Delays the return of a save of a policy with the given make, after the
/// record has already been written.
struct SlowSaveStore {
    inner: MemoryPolicyStore,
    slow_make: &'static str,
}

impl PolicyStore for SlowSaveStore {
    fn find_by_id(&self, id: u64) -> StoreResult<Option<AutoPolicy>> {
        self.inner.find_by_id(id)
    }

    fn find_by_policy_number(&self, policy_number: &str) -> StoreResult<Option<AutoPolicy>> {
        self.inner.find_by_policy_number(policy_number)
    }

    fn find_all(&self) -> StoreResult<Vec<AutoPolicy>> {
        self.inner.find_all()
    }

    fn find_filtered(&self, filter: &PolicyFilter) -> StoreResult<Vec<AutoPolicy>> {
        self.inner.find_filtered(filter)
    }

    fn save(&self, policy: AutoPolicy) -> StoreResult<AutoPolicy> {
        let slow = policy.vehicle_make.as_deref() == Some(self.slow_make);
        let saved = self.inner.save(policy)?;
        if slow {
            thread::sleep(Duration::from_millis(300));
        }
        Ok(saved)
    }

    fn save_all(&self, policies: Vec<AutoPolicy>) -> StoreResult<Vec<AutoPolicy>> {
        self.inner.save_all(policies)
    }

    fn exists_by_id(&self, id: u64) -> StoreResult<bool> {
        self.inner.exists_by_id(id)
    }

    fn delete_by_id(&self, id: u64) -> StoreResult<()> {
        self.inner.delete_by_id(id)
    }
}

fn slow_setup() -> (Arc<SlowSaveStore>, Arc<PolicyService>, u64) {
    let store = Arc::new(SlowSaveStore {
        inner: MemoryPolicyStore::new(),
        slow_make: "Saab",
    });
    let service = Arc::new(PolicyService::new(store.clone(), &CachePolicy::default()));
    let id = service
        .create_policy(policy("AP-1", "Kia", PolicyStatus::Active))
        .unwrap()
        .id
        .unwrap();
    (store, service, id)
}

/// Starts a slow update to make "Saab" and gives it time to reach the store.
fn spawn_slow_update(service: &Arc<PolicyService>, id: u64) -> thread::JoinHandle<()> {
    let service = Arc::clone(service);
    let handle = thread::spawn(move || {
        assert_ok!(service.update_policy(id, policy("AP-1", "Saab", PolicyStatus::Active)));
    });
    thread::sleep(Duration::from_millis(50));
    handle
}

#[test]
fn test_update_racing_delete_leaves_no_cached_record() {
    let (store, service, id) = slow_setup();

    let updater = spawn_slow_update(&service, id);
    assert_ok!(service.delete_policy(id));
    updater.join().unwrap();

    assert!(!store.exists_by_id(id).unwrap());
    assert!(service.caches().by_id.get(&id).is_none());
    assert!(matches!(service.get_policy_by_id(id), Err(AppError::NotFound(_))));
}

#[test]
fn test_racing_updates_cache_the_stored_value() {
    let (store, service, id) = slow_setup();

    let updater = spawn_slow_update(&service, id);
    assert_ok!(service.update_policy(id, policy("AP-1", "Volvo", PolicyStatus::Active)));
    updater.join().unwrap();

    let stored = store.find_by_id(id).unwrap().unwrap();
    let cached = service.get_policy_by_id(id).unwrap();
    assert_eq!(cached.vehicle_make, stored.vehicle_make);
    assert_eq!(cached.vehicle_make.as_deref(), Some("Volvo"));
}
