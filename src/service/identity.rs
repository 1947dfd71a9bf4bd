use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    entities::accounts,
    error::{AppError, AppResult},
    repo::accounts::{AccountsRepo, NewAccount},
    service::identity_provider::IdentityAssertion,
};

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Maps a verified provider identity to its account, creating the account on
    /// first sign-in. An email registered through another provider is a conflict.
    async fn resolve(&self, assertion: IdentityAssertion) -> AppResult<accounts::Model>;
}

pub struct IdentityServiceImpl {
    accounts_repo: Arc<dyn AccountsRepo>,
}

impl IdentityServiceImpl {
    pub fn new(accounts_repo: Arc<dyn AccountsRepo>) -> Self {
        Self { accounts_repo }
    }

    fn normalize_email(email: &str) -> AppResult<String> {
        let value = email.trim().to_lowercase();
        if value.is_empty() || !value.contains('@') {
            return Err(AppError::Validation("invalid email".to_string()));
        }
        Ok(value)
    }

    fn match_provider(account: accounts::Model, provider: &str) -> AppResult<accounts::Model> {
        if account.provider == provider {
            return Ok(account);
        }
        tracing::warn!(
            account_uid = %account.uid,
            registered = %account.provider,
            attempted = provider,
            "sign-in rejected: email bound to another provider"
        );
        Err(AppError::IdentityConflict {
            registered: account.provider,
        })
    }
}

#[async_trait]
impl IdentityService for IdentityServiceImpl {
    async fn resolve(&self, assertion: IdentityAssertion) -> AppResult<accounts::Model> {
        let email = Self::normalize_email(&assertion.email)?;

        if let Some(existing) = self.accounts_repo.find_by_email(&email).await? {
            return Self::match_provider(existing, &assertion.provider);
        }

        let new_account = NewAccount {
            external_id: assertion.external_id,
            email: email.clone(),
            first_name: assertion.first_name,
            last_name: assertion.last_name,
            avatar_url: assertion.avatar_url,
            provider: assertion.provider.clone(),
        };

        match self.accounts_repo.insert(new_account).await {
            Ok(account) => {
                tracing::info!(account_uid = %account.uid, provider = %account.provider, "account created");
                Ok(account)
            }
            Err(err) => {
                // A concurrent first sign-in for the same email wins the unique index;
                // resolve against whatever it created.
                match self.accounts_repo.find_by_email(&email).await? {
                    Some(existing) => Self::match_provider(existing, &assertion.provider),
                    None => Err(err.into()),
                }
            }
        }
    }
}
