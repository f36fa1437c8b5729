use hourglass_rs::SafeTimeProvider;
use tracing::debug;
use uuid::Uuid;

use super::Ledger;
use crate::errors::{LedgerError, Result};
use crate::events::Event;
use crate::store::{Cache, InvestmentStore, UserStore, WithdrawalStore};
use crate::types::{InvestmentId, Page, UserId, Withdrawal, WithdrawalId};

fn withdrawal_key(id: WithdrawalId, user_id: UserId) -> String {
    format!("withdrawal:{id}:user:{user_id}")
}

fn investment_withdrawal_key(investment_id: InvestmentId, user_id: UserId) -> String {
    format!("withdrawal:investment:{investment_id}:user:{user_id}")
}

fn withdrawals_key(user_id: UserId, page: Page) -> String {
    format!(
        "withdrawals:user:{user_id}:page:{}:limit:{}",
        page.page, page.limit
    )
}

impl<S, C> Ledger<'_, S, C>
where
    S: UserStore + InvestmentStore + WithdrawalStore,
    C: Cache,
{
    /// realize an investment's value into a withdrawal
    ///
    /// deactivation runs first with its full precondition chain, so at
    /// most one withdrawal can ever exist per investment: a second
    /// attempt dies inside deactivation. the payout is valued at the
    /// freeze point, net of tax.
    pub fn withdraw_investment(
        &mut self,
        investment_id: InvestmentId,
        user_id: UserId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Withdrawal> {
        let investment = self.deactivate_investment(investment_id, user_id, time_provider)?;

        let frozen_at = investment
            .deleted_at
            .ok_or(LedgerError::WithdrawalFailed { investment_id })?;
        let valuation = self
            .calculator
            .value_at(investment.amount, investment.created_at, frozen_at);

        let withdrawal = Withdrawal {
            id: Uuid::new_v4(),
            user_id,
            investment_id,
            amount: valuation.net,
            created_at: frozen_at,
        };
        self.store.insert_withdrawal(&withdrawal)?;

        debug!(
            withdrawal_id = %withdrawal.id,
            investment_id = %investment_id,
            amount = %withdrawal.amount,
            "withdrawal realized"
        );
        self.events.emit(Event::WithdrawalRealized {
            withdrawal_id: withdrawal.id,
            investment_id,
            user_id,
            amount: withdrawal.amount,
            timestamp: frozen_at,
        });

        Ok(withdrawal)
    }

    /// fetch one withdrawal
    ///
    /// scoped to the requesting user: someone else's withdrawal reports
    /// as not found, never as an authorization failure.
    pub fn withdrawal(
        &self,
        id: WithdrawalId,
        user_id: UserId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Withdrawal> {
        self.require_active_user(user_id)?;

        let now = time_provider.now();
        let key = withdrawal_key(id, user_id);
        if let Some(withdrawal) = self.cached::<Withdrawal>(&key, now) {
            return Ok(withdrawal);
        }

        let withdrawal = self
            .store
            .withdrawal_by_id(id)?
            .filter(|w| w.user_id == user_id)
            .ok_or(LedgerError::WithdrawalNotFound)?;
        self.remember(&key, &withdrawal, now);
        Ok(withdrawal)
    }

    /// fetch the withdrawal realized from an investment, if any
    pub fn withdrawal_for_investment(
        &self,
        investment_id: InvestmentId,
        user_id: UserId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Withdrawal> {
        self.require_active_user(user_id)?;

        let now = time_provider.now();
        let key = investment_withdrawal_key(investment_id, user_id);
        if let Some(withdrawal) = self.cached::<Withdrawal>(&key, now) {
            return Ok(withdrawal);
        }

        let withdrawal = self
            .store
            .withdrawal_by_investment(investment_id)?
            .filter(|w| w.user_id == user_id)
            .ok_or(LedgerError::WithdrawalNotFound)?;
        self.remember(&key, &withdrawal, now);
        Ok(withdrawal)
    }

    /// list a user's withdrawals, paginated
    pub fn withdrawals(
        &self,
        user_id: UserId,
        page: Page,
        time_provider: &SafeTimeProvider,
    ) -> Result<Vec<Withdrawal>> {
        self.require_active_user(user_id)?;

        let now = time_provider.now();
        let key = withdrawals_key(user_id, page);
        if let Some(withdrawals) = self.cached::<Vec<Withdrawal>>(&key, now) {
            return Ok(withdrawals);
        }

        let withdrawals = self.store.withdrawals_by_user(user_id, page)?;
        self.remember(&key, &withdrawals, now);
        Ok(withdrawals)
    }
}
