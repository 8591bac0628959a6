//! 管理服务路由模块

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use common::middleware::principal_middleware;

use crate::handlers;
use crate::state::AppState;

/// 创建管理服务路由
///
/// 管理端点全部要求网关转发的主体信息；健康检查无需认证。
pub fn router() -> Router<AppState> {
    let admin = Router::new()
        .route("/api/admin/stats", get(handlers::get_stats))
        .route(
            "/api/admin/cleanup-test-data",
            post(handlers::cleanup_test_data),
        )
        .route("/api/admin/trigger-backup", post(handlers::trigger_backup))
        .layer(middleware::from_fn(principal_middleware));

    Router::new()
        .merge(admin)
        .route("/api/health", get(handlers::health_check))
}
