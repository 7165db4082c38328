mod api;
mod core;
mod infra;
mod models;

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::core::executor::QueryExecutor;
use crate::infra::backend::PgBackend;
use crate::infra::config::AppConfig;

pub mod ax_state {
    use super::*;
    pub struct AppState {
        pub executor: QueryExecutor,
        pub enforce_allowlist: bool,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pool = infra::db::init_pool(&config).await?;
    let backend = Arc::new(PgBackend::new(pool, config.rpc_function.clone()));

    // 客户端显式构造并注入，不使用全局单例
    let state = Arc::new(ax_state::AppState {
        executor: QueryExecutor::new(backend, config.execution_mode),
        enforce_allowlist: config.enforce_allowlist,
    });

    let app = api::router(state);

    info!(
        "Work Suite 查询服务运行在 http://{} (mode={:?}, allowlist={})",
        config.bind_addr, config.execution_mode, config.enforce_allowlist
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
