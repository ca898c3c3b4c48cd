//! Database pool, table bootstrap and transaction settling.

use crate::error::ServiceResult;
use crate::orm::{builders, review_fields, review_images, review_values, reviews, users};
use once_cell::sync::OnceCell;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr,
    Schema,
};

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Connects the global pool. Call once at startup.
pub async fn init_db(database_url: String) -> Result<(), DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(crate::app_config::server().max_db_connections)
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    if DB_POOL.set(db).is_err() {
        log::warn!("init_db called more than once; keeping the first pool");
    }
    Ok(())
}

/// Returns the global pool.
/// Panics if `init_db` has not completed.
pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL
        .get()
        .expect("Database pool is not initialized. Call init_db first.")
}

/// Creates every table this crate owns, skipping those that already exist.
/// Tables are created parents first so foreign keys resolve on every backend.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = vec![
        schema.create_table_from_entity(users::Entity),
        schema.create_table_from_entity(builders::Entity),
        schema.create_table_from_entity(review_fields::Entity),
        schema.create_table_from_entity(reviews::Entity),
        schema.create_table_from_entity(review_values::Entity),
        schema.create_table_from_entity(review_images::Entity),
    ];

    for statement in statements.iter_mut() {
        statement.if_not_exists();
        db.execute(backend.build(&*statement)).await?;
    }

    Ok(())
}

/// Creates tables and, when configured, seeds the default review schema.
pub async fn bootstrap(db: &DatabaseConnection) -> ServiceResult<()> {
    create_tables(db).await?;

    if crate::app_config::schema().seed_defaults {
        let seeded = crate::review_schema::seed_default_fields(db).await?;
        if seeded > 0 {
            log::info!("Seeded {} default review fields", seeded);
        }
    }

    Ok(())
}

/// Commits `txn` when `result` is Ok, rolls it back otherwise.
///
/// Every review and schema mutation ends here so a failed step can never
/// leave part of its unit of work behind.
pub async fn finish_transaction<T>(
    txn: DatabaseTransaction,
    result: ServiceResult<T>,
) -> ServiceResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                log::error!("Rollback failed after {}: {}", e, rollback_err);
            }
            Err(e)
        }
    }
}
