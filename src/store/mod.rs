mod memory;

pub use memory::{MemoryCache, MemoryStore};

use chrono::{DateTime, Duration, Utc};

use crate::errors::Result;
use crate::types::{
    Investment, InvestmentId, InvestmentStatus, Page, User, UserId, Withdrawal, WithdrawalId,
};

/// persistence surface for user accounts
pub trait UserStore {
    /// persist a freshly registered user
    fn insert_user(&self, user: &User) -> Result<()>;

    fn user_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// fetch by exact email
    fn user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// persist the given snapshot over the stored record
    fn update_user(&self, user: &User) -> Result<()>;

    /// list users in registration order
    fn users(&self, page: Page) -> Result<Vec<User>>;
}

/// persistence surface for investments
pub trait InvestmentStore {
    fn insert_investment(&self, investment: &Investment) -> Result<()>;

    fn investment_by_id(&self, id: InvestmentId) -> Result<Option<Investment>>;

    /// list a user's investments in creation order, optionally filtered
    /// by lifecycle status
    fn investments_by_user(
        &self,
        user_id: UserId,
        status: Option<InvestmentStatus>,
        page: Page,
    ) -> Result<Vec<Investment>>;

    /// set the freeze point if, and only if, the investment is still
    /// active, as one atomic state-check-and-update; returns the updated
    /// record, or None when the condition did not hold
    fn deactivate_if_active(
        &self,
        id: InvestmentId,
        at: DateTime<Utc>,
    ) -> Result<Option<Investment>>;
}

/// persistence surface for withdrawals
pub trait WithdrawalStore {
    fn insert_withdrawal(&self, withdrawal: &Withdrawal) -> Result<()>;

    fn withdrawal_by_id(&self, id: WithdrawalId) -> Result<Option<Withdrawal>>;

    fn withdrawal_by_investment(&self, investment_id: InvestmentId)
        -> Result<Option<Withdrawal>>;

    /// list a user's withdrawals in creation order
    fn withdrawals_by_user(&self, user_id: UserId, page: Page) -> Result<Vec<Withdrawal>>;
}

/// cache surface for read results, string keys to serialized values
///
/// entries live for their ttl and are never invalidated by writes;
/// readers tolerate that bounded staleness.
pub trait Cache {
    /// fetch a live entry; expired entries read as misses
    fn get(&self, key: &str, now: DateTime<Utc>) -> Option<String>;

    /// store a value until now + ttl
    fn set(&self, key: &str, value: String, ttl: Duration, now: DateTime<Utc>);
}
