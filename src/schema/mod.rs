use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use sea_orm_migration::prelude::*;

mod accounts;
mod portfolio_records;

pub async fn apply(conn: &DatabaseConnection) -> Result<(), DbErr> {
    let manager = SchemaManager::new(conn);

    conn.execute(Statement::from_string(
        DbBackend::Postgres,
        "CREATE EXTENSION IF NOT EXISTS pgcrypto".to_string(),
    ))
    .await?;

    accounts::apply(&manager, conn).await?;
    portfolio_records::apply(&manager, conn).await?;
    apply_audit_invariants(conn).await?;
    apply_record_immutability(conn).await?;

    Ok(())
}

async fn apply_audit_invariants(conn: &DatabaseConnection) -> Result<(), DbErr> {
    conn.execute(Statement::from_string(
        DbBackend::Postgres,
        r#"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS trigger AS $$
BEGIN
  NEW.updated_at = now();
  RETURN NEW;
END;
$$ LANGUAGE plpgsql;
"#
        .to_string(),
    ))
    .await?;

    for table in ["accounts"] {
        let trigger_name = format!("trg_{}_set_updated_at", table);
        conn.execute(Statement::from_string(
            DbBackend::Postgres,
            format!(
                r#"
DO $$
BEGIN
  IF NOT EXISTS (
    SELECT 1
    FROM pg_trigger
    WHERE tgname = '{trigger_name}'
      AND tgrelid = '{table}'::regclass
  ) THEN
    EXECUTE 'CREATE TRIGGER {trigger_name}
             BEFORE UPDATE ON {table}
             FOR EACH ROW
             EXECUTE FUNCTION set_updated_at()';
  END IF;
END $$;
"#
            ),
        ))
        .await?;
    }

    Ok(())
}

// Superseded records are retained as history, so rows may only ever be inserted.
async fn apply_record_immutability(conn: &DatabaseConnection) -> Result<(), DbErr> {
    conn.execute(Statement::from_string(
        DbBackend::Postgres,
        r#"
CREATE OR REPLACE FUNCTION reject_portfolio_record_mutation()
RETURNS trigger AS $$
BEGIN
  RAISE EXCEPTION 'portfolio_records rows are immutable';
END;
$$ LANGUAGE plpgsql;
"#
        .to_string(),
    ))
    .await?;

    conn.execute(Statement::from_string(
        DbBackend::Postgres,
        r#"
DO $$
BEGIN
  IF NOT EXISTS (
    SELECT 1
    FROM pg_trigger
    WHERE tgname = 'trg_portfolio_records_immutable'
      AND tgrelid = 'portfolio_records'::regclass
  ) THEN
    EXECUTE 'CREATE TRIGGER trg_portfolio_records_immutable
             BEFORE UPDATE OR DELETE ON portfolio_records
             FOR EACH ROW
             EXECUTE FUNCTION reject_portfolio_record_mutation()';
  END IF;
END $$;
"#
        .to_string(),
    ))
    .await?;

    Ok(())
}
