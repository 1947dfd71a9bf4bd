use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{entities::accounts, state::DatabaseClient};

#[derive(Clone, Debug)]
pub struct NewAccount {
    pub external_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub provider: String,
}

#[async_trait]
pub trait AccountsRepo: Send + Sync {
    async fn insert(&self, account: NewAccount) -> Result<accounts::Model, sea_orm::DbErr>;
    async fn find_by_uid(&self, uid: Uuid) -> Result<Option<accounts::Model>, sea_orm::DbErr>;
    async fn find_by_email(&self, email: &str)
        -> Result<Option<accounts::Model>, sea_orm::DbErr>;
    /// Single-column write of the active record pointer.
    async fn set_active_record(&self, account_id: i64, record_id: i64)
        -> Result<(), sea_orm::DbErr>;
    async fn set_selected_theme(
        &self,
        account_id: i64,
        theme: &str,
    ) -> Result<Option<accounts::Model>, sea_orm::DbErr>;
}

pub struct SeaOrmAccountsRepo {
    db: std::sync::Arc<dyn DatabaseClient>,
}

impl SeaOrmAccountsRepo {
    pub fn new(db: std::sync::Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }

    async fn update_column(
        &self,
        account_id: i64,
        column: accounts::Column,
        value: sea_orm::Value,
    ) -> Result<u64, sea_orm::DbErr> {
        let result = accounts::Entity::update_many()
            .col_expr(column, Expr::value(value))
            .filter(accounts::Column::Id.eq(account_id))
            .exec(self.db.conn())
            .await?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl AccountsRepo for SeaOrmAccountsRepo {
    async fn insert(&self, account: NewAccount) -> Result<accounts::Model, sea_orm::DbErr> {
        let model = accounts::ActiveModel {
            uid: Set(Uuid::new_v4()),
            external_id: Set(account.external_id),
            email: Set(account.email),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            avatar_url: Set(account.avatar_url),
            provider: Set(account.provider),
            selected_theme: Set(None),
            active_record_id: Set(None),
            ..Default::default()
        };
        model.insert(self.db.conn()).await
    }

    async fn find_by_uid(&self, uid: Uuid) -> Result<Option<accounts::Model>, sea_orm::DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Uid.eq(uid))
            .one(self.db.conn())
            .await
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<accounts::Model>, sea_orm::DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(self.db.conn())
            .await
    }

    async fn set_active_record(
        &self,
        account_id: i64,
        record_id: i64,
    ) -> Result<(), sea_orm::DbErr> {
        let updated = self
            .update_column(
                account_id,
                accounts::Column::ActiveRecordId,
                Some(record_id).into(),
            )
            .await?;
        if updated == 0 {
            return Err(sea_orm::DbErr::RecordNotUpdated);
        }
        Ok(())
    }

    async fn set_selected_theme(
        &self,
        account_id: i64,
        theme: &str,
    ) -> Result<Option<accounts::Model>, sea_orm::DbErr> {
        let updated = self
            .update_column(
                account_id,
                accounts::Column::SelectedTheme,
                Some(theme.to_string()).into(),
            )
            .await?;
        if updated == 0 {
            return Ok(None);
        }
        accounts::Entity::find_by_id(account_id)
            .one(self.db.conn())
            .await
    }
}
