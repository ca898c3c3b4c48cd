//! Test database setup and management
#![allow(dead_code)]

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

/// Opens a private in-memory SQLite database with every table created.
///
/// The pool holds exactly one connection, so the database lives as long as
/// the returned handle. Never touch `db` while a transaction on it is open.
pub async fn setup_empty_database() -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await?;
    homerate::db::create_tables(&db).await?;
    Ok(db)
}

/// Like [`setup_empty_database`], with the default review schema seeded.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let db = setup_empty_database().await?;
    homerate::review_schema::seed_default_fields(&db)
        .await
        .map_err(|e| DbErr::Custom(format!("Seeding default fields failed: {}", e)))?;
    Ok(db)
}

/// Runs a raw statement, e.g. to install a trigger.
pub async fn execute_sql(db: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        sql.to_string(),
    ))
    .await?;
    Ok(())
}
