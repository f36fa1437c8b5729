use hourglass_rs::SafeTimeProvider;
use tracing::debug;
use uuid::Uuid;

use super::Ledger;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::Event;
use crate::store::{Cache, InvestmentStore, UserStore, WithdrawalStore};
use crate::types::{Investment, InvestmentId, InvestmentQuery, InvestmentView, UserId};
use crate::validation::{ensure_valid, validate_deposit};

fn investment_key(id: InvestmentId, user_id: UserId) -> String {
    format!("investment:{id}:user:{user_id}")
}

fn investments_key(user_id: UserId, query: &InvestmentQuery) -> String {
    let status = match query.status {
        Some(status) => status.to_string(),
        None => "any".to_string(),
    };
    format!(
        "investments:user:{user_id}:page:{}:limit:{}:status:{status}",
        query.page.page, query.page.limit
    )
}

impl<S, C> Ledger<'_, S, C>
where
    S: UserStore + InvestmentStore + WithdrawalStore,
    C: Cache,
{
    /// open a new investment for a user
    pub fn open_investment(
        &mut self,
        user_id: UserId,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<Investment> {
        ensure_valid(validate_deposit(amount, self.config.minimum_investment))?;
        self.require_active_user(user_id)?;

        let now = time_provider.now();
        let investment = Investment {
            id: Uuid::new_v4(),
            user_id,
            amount,
            created_at: now,
            deleted_at: None,
        };
        self.store.insert_investment(&investment)?;

        debug!(investment_id = %investment.id, user_id = %user_id, %amount, "investment opened");
        self.events.emit(Event::InvestmentOpened {
            investment_id: investment.id,
            user_id,
            amount,
            timestamp: now,
        });

        Ok(investment)
    }

    /// fetch one investment with its computed balance
    ///
    /// scoped to the requesting user: someone else's investment reads as
    /// not found. the balance is valued at the freeze point for a closed
    /// investment and at the current time otherwise.
    pub fn investment(
        &self,
        id: InvestmentId,
        user_id: UserId,
        time_provider: &SafeTimeProvider,
    ) -> Result<InvestmentView> {
        self.require_active_user(user_id)?;

        let now = time_provider.now();
        let key = investment_key(id, user_id);
        if let Some(view) = self.cached::<InvestmentView>(&key, now) {
            return Ok(view);
        }

        let investment = self
            .store
            .investment_by_id(id)?
            .filter(|i| i.user_id == user_id)
            .ok_or(LedgerError::InvestmentNotFound { id })?;
        let balance = self.calculator.appraise(&investment, time_provider).net;
        let view = InvestmentView::from_investment(&investment, balance);
        self.remember(&key, &view, now);
        Ok(view)
    }

    /// list a user's investments with computed balances, optionally
    /// filtered by lifecycle status, paginated
    pub fn investments(
        &self,
        user_id: UserId,
        query: &InvestmentQuery,
        time_provider: &SafeTimeProvider,
    ) -> Result<Vec<InvestmentView>> {
        self.require_active_user(user_id)?;

        let now = time_provider.now();
        let key = investments_key(user_id, query);
        if let Some(views) = self.cached::<Vec<InvestmentView>>(&key, now) {
            return Ok(views);
        }

        let views: Vec<InvestmentView> = self
            .store
            .investments_by_user(user_id, query.status, query.page)?
            .iter()
            .map(|investment| {
                let balance = self.calculator.appraise(investment, time_provider).net;
                InvestmentView::from_investment(investment, balance)
            })
            .collect();
        self.remember(&key, &views, now);
        Ok(views)
    }

    /// close out an investment, freezing its value at this moment
    ///
    /// preconditions run in a fixed order: the record must exist, the
    /// acting user must own it, it must still be active, and the owner
    /// account must be active. the store then re-checks liveness in one
    /// atomic update, so a lost race reports as already deactivated.
    pub fn deactivate_investment(
        &mut self,
        id: InvestmentId,
        user_id: UserId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Investment> {
        let investment = self
            .store
            .investment_by_id(id)?
            .ok_or(LedgerError::InvestmentNotFound { id })?;
        if investment.user_id != user_id {
            return Err(LedgerError::Unauthorized {
                investment_id: id,
                user_id,
            });
        }
        if !investment.is_active() {
            return Err(LedgerError::InvestmentAlreadyDeactivated { id });
        }
        self.require_active_user(user_id)?;

        let now = time_provider.now();
        let investment = self
            .store
            .deactivate_if_active(id, now)?
            .ok_or(LedgerError::InvestmentAlreadyDeactivated { id })?;

        debug!(investment_id = %id, user_id = %user_id, "investment deactivated");
        self.events.emit(Event::InvestmentDeactivated {
            investment_id: id,
            user_id,
            timestamp: now,
        });

        Ok(investment)
    }
}
