//! 分会门户管理监控服务
//!
//! 提供分会门户的管理能力，包括：
//! - 系统统计快照（存储、连接、名册/任务/工时记录数）
//! - 健康评分（四项固定检查 + 总分）
//! - 测试数据清理
//! - 备份触发与保留策略

mod backup;
mod handlers;
mod health;
mod routes;
mod service;
mod state;
mod stats;
mod store;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig};
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "admin-service";
const DEFAULT_PORT: u16 = 8084;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "管理监控服务 API",
        version = "0.1.0",
        description = "分会门户管理监控微服务"
    ),
    paths(
        handlers::get_stats,
        handlers::cleanup_test_data,
        handlers::trigger_backup,
        handlers::health_check,
    ),
    components(schemas(
        common::models::SystemStatsSnapshot,
        common::models::StorageMetrics,
        common::models::ConnectionMetrics,
        common::models::RecordCounts,
        common::models::MemberCounts,
        common::models::TaskCounts,
        common::models::HourLogCounts,
        common::models::TestRecordCounts,
        common::models::LatestBackup,
        common::models::HealthReport,
        common::models::HealthCheckResult,
        common::models::HealthStatus,
        common::models::Principal,
        handlers::CleanupResult,
        handlers::BackupTriggerResult,
        handlers::HealthResponse,
    )),
    tags(
        (name = "admin", description = "管理端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (if present) before anything else
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let mut config = AppConfig::load_with_service(SERVICE_NAME);
    config.port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    // 创建应用状态（MongoDB 客户端进程内复用）
    let state = AppState::new(config.clone())
        .await
        .context("初始化应用状态失败（检查 MONGODB_URI）")?;

    // 创建路由
    let app = create_router(state);

    // 启动服务
    let addr = format!("{}:{}", config.host, config.port);
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr).await.context("绑定地址失败")?;
    axum::serve(listener, app).await.context("服务启动失败")?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
