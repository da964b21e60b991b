pub mod comment;
pub mod engagement;
pub mod notification;
pub mod party;
pub mod user;
use crate::PGPool;
use log::info;
use sqlx::postgres::PgPoolOptions;

pub async fn init_db_pool(db_url: &str, max_connections: u32) -> Result<PGPool, sqlx::Error> {
    let pool: PGPool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await?;
    info!("{}", "Connect with postgresql");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("database schema is up to date");
    Ok(pool)
}
