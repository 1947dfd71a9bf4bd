use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::{
    error::AppResult,
    repo::{accounts::SeaOrmAccountsRepo, portfolio_records::SeaOrmPortfolioRecordsRepo},
    service::{
        accounts::{AccountsService, AccountsServiceImpl},
        blob_store::DiskBlobStore,
        config::{ConfigService, ConfigServiceImpl},
        identity::{IdentityService, IdentityServiceImpl},
        identity_provider::{GoogleIdentityProvider, IdentityProvider},
        portfolio::{PortfolioService, PortfolioServiceImpl},
        session::{MemorySessionService, RedisSessionService, SessionService},
    },
};

pub trait DatabaseClient: Send + Sync {
    fn conn(&self) -> &DatabaseConnection;
}

pub struct SeaOrmDatabaseClient {
    conn: DatabaseConnection,
}

impl SeaOrmDatabaseClient {
    pub async fn new() -> AppResult<Self> {
        let conn = crate::db::connect().await?;
        crate::schema::apply(&conn).await?;
        tracing::info!("database schema applied");
        Ok(Self { conn })
    }
}

impl DatabaseClient for SeaOrmDatabaseClient {
    fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }
}

/// Every shared handle the request handlers use, built once at startup.
pub struct AppState {
    config: Arc<dyn ConfigService>,
    sessions: Arc<dyn SessionService>,
    identity: Arc<dyn IdentityService>,
    identity_provider: Arc<dyn IdentityProvider>,
    accounts: Arc<dyn AccountsService>,
    portfolio: Arc<dyn PortfolioService>,
}

pub struct AppStateParts {
    pub config: Arc<dyn ConfigService>,
    pub sessions: Arc<dyn SessionService>,
    pub identity: Arc<dyn IdentityService>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub accounts: Arc<dyn AccountsService>,
    pub portfolio: Arc<dyn PortfolioService>,
}

impl AppState {
    pub async fn new(config: ConfigServiceImpl) -> AppResult<Arc<Self>> {
        let values = config.values().clone();
        let db: Arc<dyn DatabaseClient> = Arc::new(SeaOrmDatabaseClient::new().await?);
        let accounts_repo = Arc::new(SeaOrmAccountsRepo::new(db.clone()));
        let records_repo = Arc::new(SeaOrmPortfolioRecordsRepo::new(db.clone()));
        let blob_store = Arc::new(DiskBlobStore::new(
            values.blob_dir.clone(),
            values.blob_public_base_url.clone(),
            values.blob_max_bytes,
        ));

        let sessions: Arc<dyn SessionService> = match &values.redis_url {
            Some(redis_url) => Arc::new(
                RedisSessionService::new(
                    redis_url,
                    values.session_ttl_seconds,
                    values.session_key_prefix.clone(),
                )
                .await?,
            ),
            None => {
                tracing::warn!("REDIS_URL is not set; sessions are kept in process memory");
                Arc::new(MemorySessionService::new(values.session_ttl_seconds))
            }
        };

        Ok(Self::from_parts(AppStateParts {
            identity: Arc::new(IdentityServiceImpl::new(accounts_repo.clone())),
            identity_provider: Arc::new(GoogleIdentityProvider::new(&values)),
            accounts: Arc::new(AccountsServiceImpl::new(accounts_repo.clone())),
            portfolio: Arc::new(PortfolioServiceImpl::new(
                accounts_repo,
                records_repo,
                blob_store,
            )),
            sessions,
            config: Arc::new(config),
        }))
    }

    pub fn from_parts(parts: AppStateParts) -> Arc<Self> {
        Arc::new(Self {
            config: parts.config,
            sessions: parts.sessions,
            identity: parts.identity,
            identity_provider: parts.identity_provider,
            accounts: parts.accounts,
            portfolio: parts.portfolio,
        })
    }

    pub fn config(&self) -> &dyn ConfigService {
        self.config.as_ref()
    }

    pub fn sessions(&self) -> &dyn SessionService {
        self.sessions.as_ref()
    }

    pub fn identity(&self) -> &dyn IdentityService {
        self.identity.as_ref()
    }

    pub fn identity_provider(&self) -> &dyn IdentityProvider {
        self.identity_provider.as_ref()
    }

    pub fn accounts(&self) -> &dyn AccountsService {
        self.accounts.as_ref()
    }

    pub fn portfolio(&self) -> &dyn PortfolioService {
        self.portfolio.as_ref()
    }
}
