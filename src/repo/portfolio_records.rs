use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{entities::portfolio_records, state::DatabaseClient};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPortfolioRecord {
    pub account_id: i64,
    pub image_url: String,
    pub display_name: String,
    pub description: String,
    pub phone_number: String,
    pub contact_email: String,
}

/// Insert-only store; there is deliberately no update or delete.
#[async_trait]
pub trait PortfolioRecordsRepo: Send + Sync {
    async fn insert(
        &self,
        record: NewPortfolioRecord,
    ) -> Result<portfolio_records::Model, sea_orm::DbErr>;
    async fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<portfolio_records::Model>, sea_orm::DbErr>;
}

pub struct SeaOrmPortfolioRecordsRepo {
    db: std::sync::Arc<dyn DatabaseClient>,
}

impl SeaOrmPortfolioRecordsRepo {
    pub fn new(db: std::sync::Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PortfolioRecordsRepo for SeaOrmPortfolioRecordsRepo {
    async fn insert(
        &self,
        record: NewPortfolioRecord,
    ) -> Result<portfolio_records::Model, sea_orm::DbErr> {
        let model = portfolio_records::ActiveModel {
            uid: Set(Uuid::new_v4()),
            account_id: Set(record.account_id),
            image_url: Set(record.image_url),
            display_name: Set(record.display_name),
            description: Set(record.description),
            phone_number: Set(record.phone_number),
            contact_email: Set(record.contact_email),
            ..Default::default()
        };
        model.insert(self.db.conn()).await
    }

    async fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<portfolio_records::Model>, sea_orm::DbErr> {
        portfolio_records::Entity::find()
            .filter(portfolio_records::Column::Id.eq(id))
            .one(self.db.conn())
            .await
    }
}
