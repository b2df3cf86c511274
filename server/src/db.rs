use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Opens the job database pool and brings the schema up to date.
pub async fn init_db(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("could not connect to the job database")?;
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("could not run job database migrations")?;
    Ok(pool)
}
