use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{InvestmentId, UserId, WithdrawalId};

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // user account events
    UserRegistered {
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },
    UserUpdated {
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },
    UserActivated {
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },
    UserDeactivated {
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },

    // investment lifecycle events
    InvestmentOpened {
        investment_id: InvestmentId,
        user_id: UserId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    InvestmentDeactivated {
        investment_id: InvestmentId,
        user_id: UserId,
        /// the freeze point: accrual stops here forever
        timestamp: DateTime<Utc>,
    },

    // withdrawal events
    WithdrawalRealized {
        withdrawal_id: WithdrawalId,
        investment_id: InvestmentId,
        user_id: UserId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
