use hourglass_rs::SafeTimeProvider;
use tracing::debug;
use uuid::Uuid;

use super::Ledger;
use crate::errors::{LedgerError, Result};
use crate::events::Event;
use crate::store::{Cache, InvestmentStore, UserStore, WithdrawalStore};
use crate::types::{Page, User, UserId, UserView};
use crate::validation::{ensure_valid, Constraint, NewUser, UserUpdate, Violation};

fn user_key(id: UserId) -> String {
    format!("user:{id}")
}

fn users_key(page: Page) -> String {
    format!("users:page:{}:limit:{}", page.page, page.limit)
}

impl<S, C> Ledger<'_, S, C>
where
    S: UserStore + InvestmentStore + WithdrawalStore,
    C: Cache,
{
    /// register a new user account
    pub fn register_user(
        &mut self,
        new_user: NewUser,
        time_provider: &SafeTimeProvider,
    ) -> Result<UserView> {
        // structural rules first, then uniqueness against the store
        let mut violations = new_user.validate();
        if violations.is_empty() && self.store.user_by_email(&new_user.email)?.is_some() {
            violations.push(Violation::new(
                "email",
                Constraint::NotUnique,
                "email already exists",
            ));
        }
        ensure_valid(violations)?;

        let now = time_provider.now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password: new_user.password,
            created_at: now,
            deleted_at: None,
        };
        self.store.insert_user(&user)?;

        debug!(user_id = %user.id, "user registered");
        self.events.emit(Event::UserRegistered {
            user_id: user.id,
            timestamp: now,
        });

        Ok(UserView::from_user(&user))
    }

    /// update fields of a user's own profile
    ///
    /// only provided fields are validated and applied. a changed email
    /// must be unused by any account, the target's own record included.
    pub fn update_user(
        &mut self,
        id: UserId,
        acting_id: UserId,
        update: UserUpdate,
        time_provider: &SafeTimeProvider,
    ) -> Result<UserView> {
        if acting_id != id {
            return Err(LedgerError::Forbidden {
                acting_id,
                target_id: id,
            });
        }

        let mut violations = update.validate();
        if violations.is_empty() {
            if let Some(email) = &update.email {
                if self.store.user_by_email(email)?.is_some() {
                    violations.push(Violation::new(
                        "email",
                        Constraint::NotUnique,
                        "email already exists",
                    ));
                }
            }
        }
        ensure_valid(violations)?;

        let mut user = self
            .store
            .user_by_id(id)?
            .ok_or(LedgerError::UserNotFound { id })?;
        if !user.is_active() {
            return Err(LedgerError::UserDeactivated { id });
        }

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(password) = update.password {
            user.password = password;
        }
        self.store.update_user(&user)?;

        debug!(user_id = %user.id, "user profile updated");
        self.events.emit(Event::UserUpdated {
            user_id: user.id,
            timestamp: time_provider.now(),
        });

        Ok(UserView::from_user(&user))
    }

    /// deactivate a user's own account
    ///
    /// investments are untouched and keep accruing; only mutating
    /// operations are blocked while the account stays deactivated.
    pub fn deactivate_user(
        &mut self,
        id: UserId,
        acting_id: UserId,
        time_provider: &SafeTimeProvider,
    ) -> Result<UserView> {
        if acting_id != id {
            return Err(LedgerError::Forbidden {
                acting_id,
                target_id: id,
            });
        }

        let mut user = self
            .store
            .user_by_id(id)?
            .ok_or(LedgerError::UserNotFound { id })?;
        if !user.is_active() {
            return Err(LedgerError::UserAlreadyInState { id, active: false });
        }

        let now = time_provider.now();
        user.deleted_at = Some(now);
        self.store.update_user(&user)?;

        debug!(user_id = %id, "user deactivated");
        self.events.emit(Event::UserDeactivated {
            user_id: id,
            timestamp: now,
        });

        Ok(UserView::from_user(&user))
    }

    /// reactivate a user's own account
    pub fn activate_user(
        &mut self,
        id: UserId,
        acting_id: UserId,
        time_provider: &SafeTimeProvider,
    ) -> Result<UserView> {
        if acting_id != id {
            return Err(LedgerError::Forbidden {
                acting_id,
                target_id: id,
            });
        }

        let mut user = self
            .store
            .user_by_id(id)?
            .ok_or(LedgerError::UserNotFound { id })?;
        if user.is_active() {
            return Err(LedgerError::UserAlreadyInState { id, active: true });
        }

        user.deleted_at = None;
        self.store.update_user(&user)?;

        debug!(user_id = %id, "user reactivated");
        self.events.emit(Event::UserActivated {
            user_id: id,
            timestamp: time_provider.now(),
        });

        Ok(UserView::from_user(&user))
    }

    /// fetch one user as a view
    pub fn user(&self, id: UserId, time_provider: &SafeTimeProvider) -> Result<UserView> {
        let now = time_provider.now();
        let key = user_key(id);
        if let Some(view) = self.cached::<UserView>(&key, now) {
            return Ok(view);
        }

        let user = self
            .store
            .user_by_id(id)?
            .ok_or(LedgerError::UserNotFound { id })?;
        let view = UserView::from_user(&user);
        self.remember(&key, &view, now);
        Ok(view)
    }

    /// list users as views, paginated
    pub fn users(&self, page: Page, time_provider: &SafeTimeProvider) -> Result<Vec<UserView>> {
        let now = time_provider.now();
        let key = users_key(page);
        if let Some(views) = self.cached::<Vec<UserView>>(&key, now) {
            return Ok(views);
        }

        let views: Vec<UserView> = self
            .store
            .users(page)?
            .iter()
            .map(UserView::from_user)
            .collect();
        self.remember(&key, &views, now);
        Ok(views)
    }
}
