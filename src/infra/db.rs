use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::infra::config::AppConfig;

pub async fn init_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
}
