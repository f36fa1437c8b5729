mod investments;
mod users;
mod withdrawals;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::config::LedgerConfig;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::store::{Cache, InvestmentStore, UserStore, WithdrawalStore};
use crate::types::{User, UserId};
use crate::valuation::YieldCalculator;

/// lifecycle coordinator for users, investments, and withdrawals
///
/// built over borrowed store and cache collaborators plus a configuration
/// value. one logical operation per call; mutations record domain events
/// the caller can drain with [`take_events`](Ledger::take_events).
pub struct Ledger<'a, S, C> {
    store: &'a S,
    cache: &'a C,
    config: LedgerConfig,
    calculator: YieldCalculator,
    events: EventStore,
}

impl<'a, S, C> Ledger<'a, S, C>
where
    S: UserStore + InvestmentStore + WithdrawalStore,
    C: Cache,
{
    /// create a new ledger over borrowed collaborators
    pub fn new(store: &'a S, cache: &'a C, config: LedgerConfig) -> Self {
        let calculator = YieldCalculator::new(config.yield_config);
        Self {
            store,
            cache,
            config,
            calculator,
            events: EventStore::new(),
        }
    }

    /// events recorded so far
    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// drain recorded events
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// fetch a user that must exist and be active before a guarded
    /// operation proceeds
    ///
    /// always reads the store: a stale cached view must never let a
    /// deactivated account through.
    fn require_active_user(&self, id: UserId) -> Result<User> {
        let user = self
            .store
            .user_by_id(id)?
            .ok_or(LedgerError::UserNotFound { id })?;
        if !user.is_active() {
            return Err(LedgerError::UserDeactivated { id });
        }
        Ok(user)
    }

    /// decode a cached read result, treating an undecodable entry as a miss
    fn cached<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let raw = self.cache.get(key, now)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(key, %error, "discarding undecodable cache entry");
                None
            }
        }
    }

    /// serialize a read result into the cache for the configured ttl
    fn remember<T: Serialize>(&self, key: &str, value: &T, now: DateTime<Utc>) {
        if let Ok(raw) = serde_json::to_string(value) {
            self.cache.set(key, raw, self.config.cache_ttl, now);
        }
    }
}
