use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    entities::{accounts, portfolio_records},
    error::{AppError, AppResult},
    repo::{
        accounts::AccountsRepo,
        portfolio_records::{NewPortfolioRecord, PortfolioRecordsRepo},
    },
    service::{
        accounts::require_account,
        blob_store::{BlobRef, BlobStore},
    },
};

/// User-supplied text of a submission. Empty strings are allowed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFields {
    pub display_name: String,
    pub description: String,
    pub phone_number: String,
    pub contact_email: String,
}

#[derive(Clone, Debug)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

/// A record that is durably stored but not yet the account's active one.
/// Only `persist` produces it, so the pointer can only advance to written rows.
#[derive(Debug)]
pub struct PersistedRecord(portfolio_records::Model);

#[async_trait]
pub trait PortfolioService: Send + Sync {
    async fn current_record(&self, caller: Option<Uuid>) -> AppResult<portfolio_records::Model>;
    /// Stores a new record for an already-stored image and makes it current.
    async fn submit(
        &self,
        caller: Option<Uuid>,
        fields: RecordFields,
        image: BlobRef,
    ) -> AppResult<portfolio_records::Model>;
    /// Stores the image, then runs `submit`.
    async fn publish(
        &self,
        caller: Option<Uuid>,
        fields: RecordFields,
        upload: ImageUpload,
    ) -> AppResult<portfolio_records::Model>;
}

pub struct PortfolioServiceImpl {
    accounts_repo: Arc<dyn AccountsRepo>,
    records_repo: Arc<dyn PortfolioRecordsRepo>,
    blob_store: Arc<dyn BlobStore>,
}

impl PortfolioServiceImpl {
    pub fn new(
        accounts_repo: Arc<dyn AccountsRepo>,
        records_repo: Arc<dyn PortfolioRecordsRepo>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            accounts_repo,
            records_repo,
            blob_store,
        }
    }

    async fn persist(
        &self,
        account: &accounts::Model,
        fields: RecordFields,
        image: &BlobRef,
    ) -> AppResult<PersistedRecord> {
        let record = self
            .records_repo
            .insert(NewPortfolioRecord {
                account_id: account.id,
                image_url: image.url.clone(),
                display_name: fields.display_name,
                description: fields.description,
                phone_number: fields.phone_number,
                contact_email: fields.contact_email,
            })
            .await
            .inspect_err(|err| {
                tracing::warn!(
                    account_uid = %account.uid,
                    blob = %image.content_hash,
                    error = %err,
                    "record persist failed; stored blob left unreferenced"
                );
            })?;
        Ok(PersistedRecord(record))
    }

    async fn activate(
        &self,
        account: &accounts::Model,
        persisted: PersistedRecord,
    ) -> AppResult<portfolio_records::Model> {
        let record = persisted.0;
        if let Err(err) = self
            .accounts_repo
            .set_active_record(account.id, record.id)
            .await
        {
            tracing::warn!(
                account_uid = %account.uid,
                record_uid = %record.uid,
                error = %err,
                "active record pointer not advanced; new record is orphaned"
            );
            return Err(err.into());
        }
        tracing::info!(
            account_uid = %account.uid,
            record_uid = %record.uid,
            previous_record_id = ?account.active_record_id,
            "active portfolio record replaced"
        );
        Ok(record)
    }

    async fn submit_for(
        &self,
        account: &accounts::Model,
        fields: RecordFields,
        image: BlobRef,
    ) -> AppResult<portfolio_records::Model> {
        let persisted = self.persist(account, fields, &image).await?;
        self.activate(account, persisted).await
    }
}

#[async_trait]
impl PortfolioService for PortfolioServiceImpl {
    async fn current_record(&self, caller: Option<Uuid>) -> AppResult<portfolio_records::Model> {
        let account = require_account(self.accounts_repo.as_ref(), caller).await?;
        let Some(record_id) = account.active_record_id else {
            return Err(AppError::NotFound("no portfolio record submitted yet".to_string()));
        };
        match self.records_repo.find_by_id(record_id).await? {
            Some(record) if record.account_id == account.id => Ok(record),
            _ => Err(AppError::NotFound(format!("portfolio record {}", record_id))),
        }
    }

    async fn submit(
        &self,
        caller: Option<Uuid>,
        fields: RecordFields,
        image: BlobRef,
    ) -> AppResult<portfolio_records::Model> {
        let account = require_account(self.accounts_repo.as_ref(), caller).await?;
        self.submit_for(&account, fields, image).await
    }

    async fn publish(
        &self,
        caller: Option<Uuid>,
        fields: RecordFields,
        upload: ImageUpload,
    ) -> AppResult<portfolio_records::Model> {
        let account = require_account(self.accounts_repo.as_ref(), caller).await?;
        let image = self
            .blob_store
            .store(upload.data, upload.content_type.as_deref())
            .await?;
        self.submit_for(&account, fields, image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        blob_ref, seeded_account, MemoryAccountsRepo, MemoryBlobStore, MemoryPortfolioRecordsRepo,
        StoreEvents,
    };

    struct Fixture {
        accounts: Arc<MemoryAccountsRepo>,
        records: Arc<MemoryPortfolioRecordsRepo>,
        blobs: Arc<MemoryBlobStore>,
        events: StoreEvents,
        service: PortfolioServiceImpl,
    }

    fn fixture() -> Fixture {
        let events = StoreEvents::default();
        let accounts = Arc::new(MemoryAccountsRepo::with_events(events.clone()));
        let records = Arc::new(MemoryPortfolioRecordsRepo::with_events(events.clone()));
        let blobs = Arc::new(MemoryBlobStore::default());
        let service = PortfolioServiceImpl::new(accounts.clone(), records.clone(), blobs.clone());
        Fixture {
            accounts,
            records,
            blobs,
            events,
            service,
        }
    }

    fn fields(name: &str) -> RecordFields {
        RecordFields {
            display_name: name.to_string(),
            description: "Y".to_string(),
            phone_number: "Z".to_string(),
            contact_email: "x@y.z".to_string(),
        }
    }

    fn upload() -> ImageUpload {
        ImageUpload {
            data: vec![1, 2, 3],
            content_type: Some("image/png".to_string()),
        }
    }

    #[tokio::test]
    async fn submitted_fields_round_trip() -> AppResult<()> {
        let f = fixture();
        let account = seeded_account(&f.accounts, "ada@example.com", "google").await;

        f.service
            .submit(Some(account.uid), fields("X"), blob_ref("https://blobs/u"))
            .await?;
        let current = f.service.current_record(Some(account.uid)).await?;

        assert_eq!(current.display_name, "X");
        assert_eq!(current.description, "Y");
        assert_eq!(current.phone_number, "Z");
        assert_eq!(current.contact_email, "x@y.z");
        assert_eq!(current.image_url, "https://blobs/u");
        assert_eq!(current.account_id, account.id);
        Ok(())
    }

    #[tokio::test]
    async fn resubmission_keeps_prior_record_but_only_newest_is_current() -> AppResult<()> {
        let f = fixture();
        let account = seeded_account(&f.accounts, "ada@example.com", "google").await;

        let first = f
            .service
            .submit(Some(account.uid), fields("first"), blob_ref("u1"))
            .await?;
        let second = f
            .service
            .submit(Some(account.uid), fields("second"), blob_ref("u2"))
            .await?;

        let stored = f.records.snapshot();
        assert_eq!(stored.len(), 2);
        assert!(stored.contains(&first));
        assert!(stored.contains(&second));

        let current = f.service.current_record(Some(account.uid)).await?;
        assert_eq!(current, second);
        let reloaded = f.accounts.find(account.id).map(|a| a.active_record_id);
        assert_eq!(reloaded, Some(Some(second.id)));
        Ok(())
    }

    #[tokio::test]
    async fn record_is_persisted_before_pointer_moves() -> AppResult<()> {
        let f = fixture();
        let account = seeded_account(&f.accounts, "ada@example.com", "google").await;

        let record = f
            .service
            .submit(Some(account.uid), fields("X"), blob_ref("u"))
            .await?;

        assert_eq!(
            f.events.take(),
            vec![
                format!("insert_record:{}", record.id),
                format!("set_active_record:{}:{}", account.id, record.id),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn no_submission_yet_is_not_found() {
        let f = fixture();
        let account = seeded_account(&f.accounts, "ada@example.com", "google").await;

        assert!(matches!(
            f.service.current_record(Some(account.uid)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn dangling_pointer_is_not_found() {
        let f = fixture();
        let account = seeded_account(&f.accounts, "ada@example.com", "google").await;
        f.accounts.force_active_record(account.id, 999);

        assert!(matches!(
            f.service.current_record(Some(account.uid)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_read_or_write() {
        let f = fixture();
        seeded_account(&f.accounts, "ada@example.com", "google").await;
        let before = f.accounts.snapshot();

        assert!(matches!(
            f.service.current_record(None).await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            f.service.submit(None, fields("X"), blob_ref("u")).await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            f.service.publish(None, fields("X"), upload()).await,
            Err(AppError::Unauthenticated)
        ));

        assert_eq!(f.accounts.snapshot(), before);
        assert!(f.records.snapshot().is_empty());
        assert_eq!(f.blobs.stored_count(), 0);
    }

    #[tokio::test]
    async fn blob_failure_leaves_no_partial_state() {
        let f = fixture();
        let account = seeded_account(&f.accounts, "ada@example.com", "google").await;
        f.blobs.fail_next();

        let result = f.service.publish(Some(account.uid), fields("X"), upload()).await;

        assert!(matches!(result, Err(AppError::BlobStore(_))));
        assert!(f.records.snapshot().is_empty());
        assert!(f.events.take().is_empty());
        assert_eq!(f.accounts.snapshot()[0].active_record_id, None);
    }

    #[tokio::test]
    async fn record_persist_failure_keeps_pointer() -> AppResult<()> {
        let f = fixture();
        let account = seeded_account(&f.accounts, "ada@example.com", "google").await;
        let first = f
            .service
            .submit(Some(account.uid), fields("first"), blob_ref("u1"))
            .await?;
        f.records.fail_next_insert();

        let result = f.service.publish(Some(account.uid), fields("second"), upload()).await;

        assert!(matches!(result, Err(AppError::Store(_))));
        assert_eq!(f.blobs.stored_count(), 1);
        assert_eq!(f.service.current_record(Some(account.uid)).await?, first);
        Ok(())
    }

    #[tokio::test]
    async fn pointer_failure_orphans_new_record_and_retry_recovers() -> AppResult<()> {
        let f = fixture();
        let account = seeded_account(&f.accounts, "ada@example.com", "google").await;
        let first = f
            .service
            .submit(Some(account.uid), fields("first"), blob_ref("u1"))
            .await?;
        f.accounts.fail_next_set_active_record();

        let result = f
            .service
            .submit(Some(account.uid), fields("second"), blob_ref("u2"))
            .await;

        assert!(matches!(result, Err(AppError::Store(_))));
        assert_eq!(f.records.snapshot().len(), 2);
        assert_eq!(f.service.current_record(Some(account.uid)).await?, first);

        let retried = f
            .service
            .submit(Some(account.uid), fields("second"), blob_ref("u2"))
            .await?;
        assert_eq!(f.records.snapshot().len(), 3);
        assert_eq!(f.service.current_record(Some(account.uid)).await?, retried);
        Ok(())
    }

    #[tokio::test]
    async fn publish_stores_blob_and_uses_its_url() -> AppResult<()> {
        let f = fixture();
        let account = seeded_account(&f.accounts, "ada@example.com", "google").await;

        let record = f.service.publish(Some(account.uid), fields("X"), upload()).await?;

        assert_eq!(f.blobs.stored_count(), 1);
        assert_eq!(record.image_url, "memory://blob/1");
        Ok(())
    }

    #[tokio::test]
    async fn accounts_never_see_each_others_records() -> AppResult<()> {
        let f = fixture();
        let ada = seeded_account(&f.accounts, "ada@example.com", "google").await;
        let bob = seeded_account(&f.accounts, "bob@example.com", "google").await;

        f.service
            .submit(Some(ada.uid), fields("ada"), blob_ref("u1"))
            .await?;

        assert!(matches!(
            f.service.current_record(Some(bob.uid)).await,
            Err(AppError::NotFound(_))
        ));
        Ok(())
    }
}
