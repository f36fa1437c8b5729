use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::LedgerError;
use crate::validation::{Constraint, Violation};

/// unique identifier for a user account
pub type UserId = Uuid;

/// unique identifier for an investment
pub type InvestmentId = Uuid;

/// unique identifier for a withdrawal
pub type WithdrawalId = Uuid;

/// user account record
///
/// the password is an opaque credential and never leaves the core: the
/// struct deliberately has no serde derives, and read operations return
/// [`UserView`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    /// None = active, Some = deactivated at that moment
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// interest-bearing investment record
///
/// value accrues from `created_at` until `deleted_at` is set; after that
/// the valuation is frozen at the deactivation moment forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: InvestmentId,
    pub user_id: UserId,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
    /// None = active and accruing, Some = closed out at that moment
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Investment {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn status(&self) -> InvestmentStatus {
        if self.is_active() {
            InvestmentStatus::Activated
        } else {
            InvestmentStatus::Deactivated
        }
    }
}

/// realized payout of a closed investment, at most one per investment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub user_id: UserId,
    pub investment_id: InvestmentId,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

/// investment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestmentStatus {
    /// open and accruing value
    Activated,
    /// closed out, value frozen at the deactivation moment
    Deactivated,
}

impl fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestmentStatus::Activated => write!(f, "activated"),
            InvestmentStatus::Deactivated => write!(f, "deactivated"),
        }
    }
}

impl FromStr for InvestmentStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activated" => Ok(InvestmentStatus::Activated),
            "deactivated" => Ok(InvestmentStatus::Deactivated),
            _ => Err(LedgerError::Validation {
                violations: vec![Violation::new(
                    "status",
                    Constraint::Format,
                    "status must be one of activated, deactivated",
                )],
            }),
        }
    }
}

/// 1-indexed pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;

    /// build a window, coercing zero fields to the defaults
    pub fn new(page: u32, limit: u32) -> Self {
        Page {
            page: if page == 0 { Self::DEFAULT_PAGE } else { page },
            limit: if limit == 0 { Self::DEFAULT_LIMIT } else { limit },
        }
    }

    /// number of records skipped before this window
    ///
    /// widened before multiplying so large pages cannot overflow, and a
    /// hand-built zero page reads as the first window.
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.limit as usize
    }
}

impl Default for Page {
    fn default() -> Self {
        Page {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// listing parameters for investment reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvestmentQuery {
    pub page: Page,
    pub status: Option<InvestmentStatus>,
}

impl InvestmentQuery {
    pub fn new(page: Page, status: Option<InvestmentStatus>) -> Self {
        InvestmentQuery { page, status }
    }

    /// parse an optional raw status filter, failing fast before any
    /// store access on an unrecognized value
    pub fn parse(page: Page, status: Option<&str>) -> crate::errors::Result<Self> {
        let status = match status {
            Some(raw) => Some(raw.parse()?),
            None => None,
        };
        Ok(InvestmentQuery { page, status })
    }
}

impl Default for InvestmentQuery {
    fn default() -> Self {
        InvestmentQuery {
            page: Page::default(),
            status: None,
        }
    }
}

/// serializable view of a user account, credential scrubbed by shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserView {
    pub fn from_user(user: &User) -> Self {
        UserView {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            deleted_at: user.deleted_at,
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// serializable view of an investment with its computed current value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentView {
    pub id: InvestmentId,
    pub user_id: UserId,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// net value at the valuation point, never persisted
    pub expected_balance: Money,
}

impl InvestmentView {
    pub fn from_investment(investment: &Investment, expected_balance: Money) -> Self {
        InvestmentView {
            id: investment.id,
            user_id: investment.user_id,
            amount: investment.amount,
            created_at: investment.created_at,
            deleted_at: investment.deleted_at,
            expected_balance,
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
