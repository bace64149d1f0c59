use anyhow::Context;

pub mod cache;
pub mod lock;
pub mod recovery;
pub mod snapshots;
pub mod users;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}
