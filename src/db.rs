use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::{mysql::MySqlPoolOptions, MySql, MySqlPool, Transaction};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
};

pub type Db = MySqlPool;

pub async fn connect(config: &Config) -> anyhow::Result<Db> {
    let url = format!(
        "mysql://{}:{}@{}:{}/{}",
        config.db_user,
        config.db_password,
        config.db_host,
        config.db_port,
        config.db_name,
    );

    let pool = MySqlPoolOptions::new()
        .max_connections(config.db_pool_size)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&url)
        .await?;

    tracing::info!(pool_size = config.db_pool_size, "Database connection pool established");
    Ok(pool)
}

/// Run all SQLx migrations from the `migrations/` directory embedded at compile time.
pub async fn run_migrations(pool: &Db) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Run `body` inside a single transaction: one connection is acquired,
/// committed on `Ok`, rolled back on `Err`. The connection is returned to
/// the pool on every exit path (sqlx rolls back on drop), so a failure
/// half-way through leaves no partial writes behind.
pub async fn transaction<T, F>(pool: &Db, body: F) -> AppResult<T>
where
    F: for<'t> FnOnce(&'t mut Transaction<'static, MySql>) -> BoxFuture<'t, AppResult<T>>,
{
    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let out = body(&mut tx).await?;
    tx.commit().await.map_err(AppError::from)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;
    use uuid::Uuid;

    use super::*;

    async fn scratch_pool() -> Db {
        let url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must point at a scratch MySQL database");
        let pool = MySqlPool::connect(&url).await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    async fn school_exists(pool: &Db, id: &str) -> bool {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schools WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap();
        count > 0
    }

    async fn insert_school(tx: &mut Transaction<'static, MySql>, id: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO schools (id, name, code) VALUES (?, ?, ?)")
            .bind(id)
            .bind("École Scratch")
            .bind(Uuid::new_v4().to_string())
            .execute(&mut **tx)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    #[tokio::test]
    #[ignore = "needs a scratch MySQL database via TEST_DATABASE_URL"]
    async fn failing_body_rolls_back_earlier_writes() {
        let pool = scratch_pool().await;
        let id = Uuid::new_v4().to_string();

        let row_id = id.clone();
        let result: AppResult<()> = transaction(&pool, move |tx| {
            async move {
                insert_school(tx, &row_id).await?;
                Err(AppError::BadRequest("boom".into()))
            }
            .boxed()
        })
        .await;

        assert!(result.is_err());
        assert!(!school_exists(&pool, &id).await, "rolled-back insert must leave no row");
    }

    #[tokio::test]
    #[ignore = "needs a scratch MySQL database via TEST_DATABASE_URL"]
    async fn successful_body_commits() {
        let pool = scratch_pool().await;
        let id = Uuid::new_v4().to_string();

        let row_id = id.clone();
        transaction(&pool, move |tx| {
            async move { insert_school(tx, &row_id).await }.boxed()
        })
        .await
        .unwrap();

        assert!(school_exists(&pool, &id).await);

        sqlx::query("DELETE FROM schools WHERE id = ?")
            .bind(&id)
            .execute(&pool)
            .await
            .unwrap();
    }
}
