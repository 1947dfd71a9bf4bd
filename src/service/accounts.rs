use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    entities::accounts,
    error::{AppError, AppResult},
    repo::accounts::AccountsRepo,
};

/// Resolves the session's account uid to a live account. A missing session and a
/// session pointing at an account that no longer exists are both unauthenticated.
pub async fn require_account(
    accounts_repo: &dyn AccountsRepo,
    caller: Option<Uuid>,
) -> AppResult<accounts::Model> {
    let Some(uid) = caller else {
        return Err(AppError::Unauthenticated);
    };
    match accounts_repo.find_by_uid(uid).await? {
        Some(account) => Ok(account),
        None => {
            tracing::debug!(account_uid = %uid, "session references unknown account");
            Err(AppError::Unauthenticated)
        }
    }
}

#[async_trait]
pub trait AccountsService: Send + Sync {
    async fn current(&self, caller: Option<Uuid>) -> AppResult<accounts::Model>;
    /// Overwrites the theme as given; allowed values are the presentation layer's concern.
    async fn set_theme(&self, caller: Option<Uuid>, theme: &str) -> AppResult<accounts::Model>;
}

pub struct AccountsServiceImpl {
    accounts_repo: Arc<dyn AccountsRepo>,
}

impl AccountsServiceImpl {
    pub fn new(accounts_repo: Arc<dyn AccountsRepo>) -> Self {
        Self { accounts_repo }
    }
}

#[async_trait]
impl AccountsService for AccountsServiceImpl {
    async fn current(&self, caller: Option<Uuid>) -> AppResult<accounts::Model> {
        require_account(self.accounts_repo.as_ref(), caller).await
    }

    async fn set_theme(&self, caller: Option<Uuid>, theme: &str) -> AppResult<accounts::Model> {
        let account = require_account(self.accounts_repo.as_ref(), caller).await?;
        let Some(updated) = self
            .accounts_repo
            .set_selected_theme(account.id, theme)
            .await?
        else {
            return Err(AppError::Unauthenticated);
        };
        tracing::info!(account_uid = %updated.uid, theme, "theme updated");
        Ok(updated)
    }
}
