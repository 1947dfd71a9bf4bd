//! In-memory stand-ins for the storage, blob and config seams, with failure injection.

use async_trait::async_trait;
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use uuid::Uuid;

use crate::{
    config::Config,
    entities::{accounts, portfolio_records},
    repo::{
        accounts::{AccountsRepo, NewAccount},
        portfolio_records::{NewPortfolioRecord, PortfolioRecordsRepo},
    },
    service::{
        blob_store::{BlobRef, BlobStore, BlobStoreError},
        identity_provider::IdentityAssertion,
    },
};

pub fn test_config() -> Config {
    Config {
        port: 0,
        google_client_id: Some("client-id".to_string()),
        google_client_secret: Some("client-secret".to_string()),
        google_redirect_url: Some("http://localhost/callback".to_string()),
        google_authorize_url: "https://accounts.example.test/auth".to_string(),
        google_token_url: "https://accounts.example.test/token".to_string(),
        google_userinfo_url: "https://accounts.example.test/userinfo".to_string(),
        post_login_redirect: None,
        redis_url: None,
        session_ttl_seconds: 3600,
        cookie_secure: false,
        cookie_domain: None,
        session_key_prefix: "test".to_string(),
        blob_dir: PathBuf::from("./target/test-blobs"),
        blob_public_base_url: "/blobs".to_string(),
        blob_max_bytes: 1024,
    }
}

pub fn assertion(email: &str, provider: &str) -> IdentityAssertion {
    IdentityAssertion {
        provider: provider.to_string(),
        external_id: format!("ext-{}", email.trim().to_lowercase()),
        email: email.to_string(),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        avatar_url: None,
    }
}

pub fn blob_ref(url: &str) -> BlobRef {
    BlobRef {
        url: url.to_string(),
        content_hash: "0".repeat(64),
        content_type: "image/png",
        size: 3,
    }
}

pub async fn seeded_account(
    repo: &Arc<MemoryAccountsRepo>,
    email: &str,
    provider: &str,
) -> accounts::Model {
    repo.insert(NewAccount {
        external_id: format!("ext-{}", email),
        email: email.to_string(),
        first_name: None,
        last_name: None,
        avatar_url: None,
        provider: provider.to_string(),
    })
    .await
    .expect("seed account")
}

/// Shared log of store writes, used to assert their ordering.
#[derive(Clone, Default)]
pub struct StoreEvents(Arc<Mutex<Vec<String>>>);

impl StoreEvents {
    fn push(&self, event: String) {
        self.0.lock().expect("events lock").push(event);
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().expect("events lock"))
    }
}

fn now() -> sea_orm::prelude::DateTimeWithTimeZone {
    chrono::Utc::now().into()
}

#[derive(Default)]
pub struct MemoryAccountsRepo {
    accounts: Mutex<Vec<accounts::Model>>,
    next_id: AtomicI64,
    events: StoreEvents,
    hide_email_lookup: AtomicBool,
    fail_set_active_record: AtomicBool,
}

impl MemoryAccountsRepo {
    pub fn with_events(events: StoreEvents) -> Self {
        Self {
            events,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> Vec<accounts::Model> {
        self.accounts.lock().expect("accounts lock").clone()
    }

    pub fn find(&self, id: i64) -> Option<accounts::Model> {
        self.snapshot().into_iter().find(|a| a.id == id)
    }

    pub fn force_active_record(&self, account_id: i64, record_id: i64) {
        let mut accounts = self.accounts.lock().expect("accounts lock");
        if let Some(account) = accounts.iter_mut().find(|a| a.id == account_id) {
            account.active_record_id = Some(record_id);
        }
    }

    pub fn hide_next_email_lookup(&self) {
        self.hide_email_lookup.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_set_active_record(&self) {
        self.fail_set_active_record.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountsRepo for MemoryAccountsRepo {
    async fn insert(&self, account: NewAccount) -> Result<accounts::Model, sea_orm::DbErr> {
        let mut accounts = self.accounts.lock().expect("accounts lock");
        if accounts
            .iter()
            .any(|a| a.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(sea_orm::DbErr::Custom(
                "duplicate key value violates unique constraint \"accounts_email_unique\""
                    .to_string(),
            ));
        }
        let model = accounts::Model {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            uid: Uuid::new_v4(),
            external_id: account.external_id,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            avatar_url: account.avatar_url,
            provider: account.provider,
            selected_theme: None,
            active_record_id: None,
            created_at: now(),
            updated_at: now(),
        };
        accounts.push(model.clone());
        Ok(model)
    }

    async fn find_by_uid(&self, uid: Uuid) -> Result<Option<accounts::Model>, sea_orm::DbErr> {
        Ok(self.snapshot().into_iter().find(|a| a.uid == uid))
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<accounts::Model>, sea_orm::DbErr> {
        if self.hide_email_lookup.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.snapshot().into_iter().find(|a| a.email == email))
    }

    async fn set_active_record(
        &self,
        account_id: i64,
        record_id: i64,
    ) -> Result<(), sea_orm::DbErr> {
        if self.fail_set_active_record.swap(false, Ordering::SeqCst) {
            return Err(sea_orm::DbErr::Custom("injected pointer failure".to_string()));
        }
        let mut accounts = self.accounts.lock().expect("accounts lock");
        let Some(account) = accounts.iter_mut().find(|a| a.id == account_id) else {
            return Err(sea_orm::DbErr::RecordNotUpdated);
        };
        account.active_record_id = Some(record_id);
        account.updated_at = now();
        self.events
            .push(format!("set_active_record:{}:{}", account_id, record_id));
        Ok(())
    }

    async fn set_selected_theme(
        &self,
        account_id: i64,
        theme: &str,
    ) -> Result<Option<accounts::Model>, sea_orm::DbErr> {
        let mut accounts = self.accounts.lock().expect("accounts lock");
        let Some(account) = accounts.iter_mut().find(|a| a.id == account_id) else {
            return Ok(None);
        };
        account.selected_theme = Some(theme.to_string());
        account.updated_at = now();
        Ok(Some(account.clone()))
    }
}

#[derive(Default)]
pub struct MemoryPortfolioRecordsRepo {
    records: Mutex<Vec<portfolio_records::Model>>,
    next_id: AtomicI64,
    events: StoreEvents,
    fail_insert: AtomicBool,
}

impl MemoryPortfolioRecordsRepo {
    pub fn with_events(events: StoreEvents) -> Self {
        Self {
            events,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> Vec<portfolio_records::Model> {
        self.records.lock().expect("records lock").clone()
    }

    pub fn fail_next_insert(&self) {
        self.fail_insert.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PortfolioRecordsRepo for MemoryPortfolioRecordsRepo {
    async fn insert(
        &self,
        record: NewPortfolioRecord,
    ) -> Result<portfolio_records::Model, sea_orm::DbErr> {
        if self.fail_insert.swap(false, Ordering::SeqCst) {
            return Err(sea_orm::DbErr::Custom("injected insert failure".to_string()));
        }
        let model = portfolio_records::Model {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            uid: Uuid::new_v4(),
            account_id: record.account_id,
            image_url: record.image_url,
            display_name: record.display_name,
            description: record.description,
            phone_number: record.phone_number,
            contact_email: record.contact_email,
            created_at: now(),
        };
        self.records
            .lock()
            .expect("records lock")
            .push(model.clone());
        self.events.push(format!("insert_record:{}", model.id));
        Ok(model)
    }

    async fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<portfolio_records::Model>, sea_orm::DbErr> {
        Ok(self.snapshot().into_iter().find(|r| r.id == id))
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    stored: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryBlobStore {
    pub fn stored_count(&self) -> usize {
        self.stored.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(
        &self,
        data: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<BlobRef, BlobStoreError> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(BlobStoreError::Io(std::io::Error::other("injected blob failure")));
        }
        if data.is_empty() {
            return Err(BlobStoreError::Empty);
        }
        let n = self.stored.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(BlobRef {
            url: format!("memory://blob/{}", n),
            content_hash: format!("{:064}", n),
            content_type: "image/png",
            size: data.len(),
        })
    }
}
