use sea_orm::{ConnectionTrait, DbBackend, DatabaseConnection, Statement};
use sea_orm_migration::prelude::*;

pub async fn apply(
    manager: &SchemaManager<'_>,
    conn: &DatabaseConnection,
) -> Result<(), DbErr> {
    if !manager.has_table("portfolio_records").await? {
        manager
            .create_table(
                Table::create()
                    .table(PortfolioRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PortfolioRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PortfolioRecords::Uid)
                            .uuid()
                            .not_null()
                            .default(SimpleExpr::Custom("gen_random_uuid()".into())),
                    )
                    .col(
                        ColumnDef::new(PortfolioRecords::AccountId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PortfolioRecords::ImageUrl).string().not_null())
                    .col(ColumnDef::new(PortfolioRecords::DisplayName).string().not_null())
                    .col(ColumnDef::new(PortfolioRecords::Description).text().not_null())
                    .col(ColumnDef::new(PortfolioRecords::PhoneNumber).string().not_null())
                    .col(ColumnDef::new(PortfolioRecords::ContactEmail).string().not_null())
                    .col(
                        ColumnDef::new(PortfolioRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Custom("now()".into())),
                    )
                    .to_owned(),
            )
            .await?;

        conn
            .execute(Statement::from_string(
                DbBackend::Postgres,
                "CREATE UNIQUE INDEX IF NOT EXISTS portfolio_records_uid_unique \
                 ON portfolio_records (uid)"
                    .to_string(),
            ))
            .await?;

        conn
            .execute(Statement::from_string(
                DbBackend::Postgres,
                "CREATE INDEX IF NOT EXISTS portfolio_records_account_id_idx \
                 ON portfolio_records (account_id)"
                    .to_string(),
            ))
            .await?;
    }

    Ok(())
}

#[derive(Iden)]
enum PortfolioRecords {
    Table,
    Id,
    Uid,
    AccountId,
    ImageUrl,
    DisplayName,
    Description,
    PhoneNumber,
    ContactEmail,
    CreatedAt,
}
