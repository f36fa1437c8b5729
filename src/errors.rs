use thiserror::Error;

use crate::types::{InvestmentId, UserId};
use crate::validation::Violation;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("validation failed: {}", crate::validation::describe(.violations))]
    Validation {
        violations: Vec<Violation>,
    },

    #[error("user not found: {id}")]
    UserNotFound {
        id: UserId,
    },

    #[error("investment not found: {id}")]
    InvestmentNotFound {
        id: InvestmentId,
    },

    #[error("withdrawal not found")]
    WithdrawalNotFound,

    #[error("user {user_id} does not own investment {investment_id}")]
    Unauthorized {
        investment_id: InvestmentId,
        user_id: UserId,
    },

    #[error("user {acting_id} may not modify account {target_id}")]
    Forbidden {
        acting_id: UserId,
        target_id: UserId,
    },

    #[error("user is deactivated: {id}")]
    UserDeactivated {
        id: UserId,
    },

    #[error("investment already deactivated: {id}")]
    InvestmentAlreadyDeactivated {
        id: InvestmentId,
    },

    #[error("user {id} is already {}", activation_state(.active))]
    UserAlreadyInState {
        id: UserId,
        active: bool,
    },

    #[error("withdrawal failed for investment {investment_id}")]
    WithdrawalFailed {
        investment_id: InvestmentId,
    },
}

fn activation_state(active: &bool) -> &'static str {
    if *active {
        "activated"
    } else {
        "deactivated"
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
