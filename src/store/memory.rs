use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::{LedgerError, Result};
use crate::store::{Cache, InvestmentStore, UserStore, WithdrawalStore};
use crate::types::{
    Investment, InvestmentId, InvestmentStatus, Page, User, UserId, Withdrawal, WithdrawalId,
};

// a poisoned lock still holds consistent data here, keep going
fn guard<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

/// in-memory store backing all three persistence surfaces
///
/// interior mutability behind mutexes lets concurrent coordinators share
/// one instance; the conditional deactivation runs under a single guard,
/// which is what makes it atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    investments: Mutex<Vec<Investment>>,
    withdrawals: Mutex<Vec<Withdrawal>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        guard(&self.users).len()
    }

    pub fn investment_count(&self) -> usize {
        guard(&self.investments).len()
    }

    pub fn withdrawal_count(&self) -> usize {
        guard(&self.withdrawals).len()
    }
}

impl UserStore for MemoryStore {
    fn insert_user(&self, user: &User) -> Result<()> {
        guard(&self.users).push(user.clone());
        Ok(())
    }

    fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(guard(&self.users).iter().find(|u| u.id == id).cloned())
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(guard(&self.users).iter().find(|u| u.email == email).cloned())
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let mut users = guard(&self.users);
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(LedgerError::UserNotFound { id: user.id }),
        }
    }

    fn users(&self, page: Page) -> Result<Vec<User>> {
        Ok(guard(&self.users)
            .iter()
            .skip(page.offset())
            .take(page.limit as usize)
            .cloned()
            .collect())
    }
}

impl InvestmentStore for MemoryStore {
    fn insert_investment(&self, investment: &Investment) -> Result<()> {
        guard(&self.investments).push(investment.clone());
        Ok(())
    }

    fn investment_by_id(&self, id: InvestmentId) -> Result<Option<Investment>> {
        Ok(guard(&self.investments)
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    fn investments_by_user(
        &self,
        user_id: UserId,
        status: Option<InvestmentStatus>,
        page: Page,
    ) -> Result<Vec<Investment>> {
        Ok(guard(&self.investments)
            .iter()
            .filter(|i| i.user_id == user_id && status.map_or(true, |s| i.status() == s))
            .skip(page.offset())
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    fn deactivate_if_active(
        &self,
        id: InvestmentId,
        at: DateTime<Utc>,
    ) -> Result<Option<Investment>> {
        let mut investments = guard(&self.investments);
        match investments
            .iter_mut()
            .find(|i| i.id == id && i.deleted_at.is_none())
        {
            Some(investment) => {
                investment.deleted_at = Some(at);
                Ok(Some(investment.clone()))
            }
            None => Ok(None),
        }
    }
}

impl WithdrawalStore for MemoryStore {
    fn insert_withdrawal(&self, withdrawal: &Withdrawal) -> Result<()> {
        guard(&self.withdrawals).push(withdrawal.clone());
        Ok(())
    }

    fn withdrawal_by_id(&self, id: WithdrawalId) -> Result<Option<Withdrawal>> {
        Ok(guard(&self.withdrawals)
            .iter()
            .find(|w| w.id == id)
            .cloned())
    }

    fn withdrawal_by_investment(
        &self,
        investment_id: InvestmentId,
    ) -> Result<Option<Withdrawal>> {
        Ok(guard(&self.withdrawals)
            .iter()
            .find(|w| w.investment_id == investment_id)
            .cloned())
    }

    fn withdrawals_by_user(&self, user_id: UserId, page: Page) -> Result<Vec<Withdrawal>> {
        Ok(guard(&self.withdrawals)
            .iter()
            .filter(|w| w.user_id == user_id)
            .skip(page.offset())
            .take(page.limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// bounded ttl cache with no write invalidation
#[derive(Debug)]
pub struct MemoryCache {
    capacity: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        guard(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let mut entries = guard(&self.entries);
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    fn set(&self, key: &str, value: String, ttl: Duration, now: DateTime<Utc>) {
        let mut entries = guard(&self.entries);
        if entries.len() >= self.capacity && !entries.contains_key(key) {
            entries.retain(|_, entry| entry.expires_at > now);
            if entries.len() >= self.capacity {
                // full of live entries: drop the one closest to expiry
                let closest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(k) = closest {
                    entries.remove(&k);
                }
            }
        }
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn sample_user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "sample".into(),
            email: email.into(),
            password: "pw".into(),
            created_at: date(2021, 1, 1),
            deleted_at: None,
        }
    }

    fn sample_investment(user_id: UserId, amount: i64) -> Investment {
        Investment {
            id: Uuid::new_v4(),
            user_id,
            amount: Money::from_major(amount),
            created_at: date(2021, 1, 1),
            deleted_at: None,
        }
    }

    #[test]
    fn test_user_lookup() {
        let store = MemoryStore::new();
        let user = sample_user("a@example.com");
        store.insert_user(&user).unwrap();

        assert_eq!(store.user_by_id(user.id).unwrap(), Some(user.clone()));
        assert_eq!(
            store.user_by_email("a@example.com").unwrap().map(|u| u.id),
            Some(user.id)
        );
        assert_eq!(store.user_by_email("b@example.com").unwrap(), None);
        assert_eq!(store.user_by_id(Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn test_update_user_snapshot() {
        let store = MemoryStore::new();
        let mut user = sample_user("a@example.com");
        store.insert_user(&user).unwrap();

        user.name = "renamed".into();
        user.deleted_at = Some(date(2021, 6, 1));
        store.update_user(&user).unwrap();

        let stored = store.user_by_id(user.id).unwrap().unwrap();
        assert_eq!(stored.name, "renamed");
        assert_eq!(stored.deleted_at, Some(date(2021, 6, 1)));
    }

    #[test]
    fn test_update_missing_user_fails() {
        let store = MemoryStore::new();
        let user = sample_user("ghost@example.com");
        assert!(matches!(
            store.update_user(&user),
            Err(LedgerError::UserNotFound { .. })
        ));
    }

    #[test]
    fn test_user_listing_pagination() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.insert_user(&sample_user(&format!("u{i}@example.com"))).unwrap();
        }

        let first = store.users(Page::new(1, 2)).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].email, "u0@example.com");

        let third = store.users(Page::new(3, 2)).unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].email, "u4@example.com");

        assert!(store.users(Page::new(4, 2)).unwrap().is_empty());
    }

    #[test]
    fn test_investment_status_filter() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let open = sample_investment(user_id, 100);
        let mut closed = sample_investment(user_id, 200);
        closed.deleted_at = Some(date(2021, 5, 1));
        let foreign = sample_investment(Uuid::new_v4(), 300);

        store.insert_investment(&open).unwrap();
        store.insert_investment(&closed).unwrap();
        store.insert_investment(&foreign).unwrap();

        let all = store
            .investments_by_user(user_id, None, Page::default())
            .unwrap();
        assert_eq!(all.len(), 2);

        let active = store
            .investments_by_user(user_id, Some(InvestmentStatus::Activated), Page::default())
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, open.id);

        let closed_only = store
            .investments_by_user(
                user_id,
                Some(InvestmentStatus::Deactivated),
                Page::default(),
            )
            .unwrap();
        assert_eq!(closed_only.len(), 1);
        assert_eq!(closed_only[0].id, closed.id);
    }

    #[test]
    fn test_conditional_deactivation_fires_once() {
        let store = MemoryStore::new();
        let investment = sample_investment(Uuid::new_v4(), 100);
        store.insert_investment(&investment).unwrap();

        let frozen = store
            .deactivate_if_active(investment.id, date(2021, 9, 1))
            .unwrap()
            .unwrap();
        assert_eq!(frozen.deleted_at, Some(date(2021, 9, 1)));

        // second attempt observes the condition as false
        assert_eq!(
            store
                .deactivate_if_active(investment.id, date(2021, 10, 1))
                .unwrap(),
            None
        );

        // the first freeze point is untouched
        let stored = store.investment_by_id(investment.id).unwrap().unwrap();
        assert_eq!(stored.deleted_at, Some(date(2021, 9, 1)));
    }

    #[test]
    fn test_conditional_deactivation_of_missing_id() {
        let store = MemoryStore::new();
        assert_eq!(
            store
                .deactivate_if_active(Uuid::new_v4(), date(2021, 9, 1))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_withdrawal_lookups() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let investment_id = Uuid::new_v4();
        let withdrawal = Withdrawal {
            id: Uuid::new_v4(),
            user_id,
            investment_id,
            amount: Money::from_major(800),
            created_at: date(2021, 9, 1),
        };
        store.insert_withdrawal(&withdrawal).unwrap();

        assert_eq!(
            store.withdrawal_by_id(withdrawal.id).unwrap(),
            Some(withdrawal.clone())
        );
        assert_eq!(
            store.withdrawal_by_investment(investment_id).unwrap(),
            Some(withdrawal.clone())
        );
        assert_eq!(store.withdrawal_by_investment(Uuid::new_v4()).unwrap(), None);

        let listed = store.withdrawals_by_user(user_id, Page::default()).unwrap();
        assert_eq!(listed, vec![withdrawal]);
    }

    #[test]
    fn test_cache_ttl_expiry() {
        let cache = MemoryCache::new();
        let t0 = date(2021, 1, 1);
        cache.set("k", "v".into(), Duration::seconds(30), t0);

        assert_eq!(cache.get("k", t0), Some("v".into()));
        assert_eq!(cache.get("k", t0 + Duration::seconds(29)), Some("v".into()));
        // at the boundary the entry is gone
        assert_eq!(cache.get("k", t0 + Duration::seconds(30)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_capacity_eviction() {
        let cache = MemoryCache::with_capacity(2);
        let t0 = date(2021, 1, 1);
        cache.set("a", "1".into(), Duration::seconds(10), t0);
        cache.set("b", "2".into(), Duration::seconds(20), t0);

        // full of live entries: inserting evicts the closest to expiry
        cache.set("c", "3".into(), Duration::seconds(30), t0);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a", t0), None);
        assert_eq!(cache.get("b", t0), Some("2".into()));
        assert_eq!(cache.get("c", t0), Some("3".into()));
    }

    #[test]
    fn test_cache_purges_expired_before_evicting_live() {
        let cache = MemoryCache::with_capacity(2);
        let t0 = date(2021, 1, 1);
        cache.set("a", "1".into(), Duration::seconds(5), t0);
        cache.set("b", "2".into(), Duration::seconds(60), t0);

        // "a" is already stale at insert time, so "b" survives
        let later = t0 + Duration::seconds(10);
        cache.set("c", "3".into(), Duration::seconds(60), later);
        assert_eq!(cache.get("b", later), Some("2".into()));
        assert_eq!(cache.get("c", later), Some("3".into()));
    }

    #[test]
    fn test_cache_overwrite_does_not_evict() {
        let cache = MemoryCache::with_capacity(2);
        let t0 = date(2021, 1, 1);
        cache.set("a", "1".into(), Duration::seconds(10), t0);
        cache.set("b", "2".into(), Duration::seconds(10), t0);

        cache.set("a", "updated".into(), Duration::seconds(10), t0);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a", t0), Some("updated".into()));
        assert_eq!(cache.get("b", t0), Some("2".into()));
    }
}
