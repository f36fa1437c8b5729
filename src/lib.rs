pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod store;
pub mod types;
pub mod validation;
pub mod valuation;

// re-export key types
pub use config::LedgerConfig;
pub use decimal::{Money, Rate};
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use ledger::Ledger;
pub use store::{Cache, InvestmentStore, MemoryCache, MemoryStore, UserStore, WithdrawalStore};
pub use types::{
    Investment, InvestmentId, InvestmentQuery, InvestmentStatus, InvestmentView, Page, User,
    UserId, UserView, Withdrawal, WithdrawalId,
};
pub use validation::{Constraint, NewUser, UserUpdate, Violation};
pub use valuation::{
    investment_value, months_between, TaxSchedule, Valuation, YieldCalculator, YieldConfig,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
