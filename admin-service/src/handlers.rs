//! Handler模块

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;
use common::models::{Principal, SystemStatsSnapshot, TestRecordCounts};
use common::response::ApiResponse;

use crate::service::{AdminService, BackupTrigger};
use crate::state::AppState;

fn admin_service(state: &AppState) -> AdminService {
    AdminService::new(
        state.store.clone(),
        state.backup.clone(),
        state.policy.clone(),
        state.config.clone(),
    )
}

/// 获取系统统计快照（存储、连接、记录数、健康评分）
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "admin",
    responses(
        (status = 200, description = "系统统计快照", body = ApiResponse<SystemStatsSnapshot>),
        (status = 401, description = "未认证"),
        (status = 403, description = "无管理权限"),
        (status = 500, description = "统计聚合失败")
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<SystemStatsSnapshot>>, AppError> {
    let service = admin_service(&state);
    let data = service.get_stats(&principal).await?;
    Ok(Json(ApiResponse::ok_with_service(data, "admin-service")))
}

/// 清理所有测试标记记录
#[utoipa::path(
    post,
    path = "/api/admin/cleanup-test-data",
    tag = "admin",
    responses(
        (status = 200, description = "清理结果", body = ApiResponse<CleanupResult>),
        (status = 401, description = "未认证"),
        (status = 403, description = "无管理权限")
    )
)]
pub async fn cleanup_test_data(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<CleanupResult>>, AppError> {
    let service = admin_service(&state);
    let report = service.cleanup_test_data(&principal).await?;
    Ok(Json(ApiResponse::ok_with_service(
        CleanupResult {
            message: format!("Removed {} test records", report.total_deleted),
            before: report.before,
            deleted: report.deleted,
            total_deleted: report.total_deleted,
        },
        "admin-service",
    )))
}

/// 触发后台备份，立即返回
#[utoipa::path(
    post,
    path = "/api/admin/trigger-backup",
    tag = "admin",
    responses(
        (status = 200, description = "备份已启动", body = ApiResponse<BackupTriggerResult>),
        (status = 401, description = "未认证"),
        (status = 403, description = "无管理权限")
    )
)]
pub async fn trigger_backup(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<BackupTriggerResult>>, AppError> {
    let service = admin_service(&state);
    let data = match service.trigger_backup(&principal)? {
        BackupTrigger::Started => BackupTriggerResult {
            status: "started".to_string(),
            message: "Backup started in the background".to_string(),
        },
        BackupTrigger::AlreadyRunning => BackupTriggerResult {
            status: "already_running".to_string(),
            message: "A backup is already in progress".to_string(),
        },
    };
    Ok(Json(ApiResponse::ok_with_service(data, "admin-service")))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "admin-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// 测试数据清理结果
#[derive(Serialize, ToSchema)]
pub struct CleanupResult {
    /// 结果摘要
    pub message: String,
    /// 清理前各类测试记录数
    pub before: TestRecordCounts,
    /// 实际删除的各类记录数
    pub deleted: TestRecordCounts,
    /// 删除总数
    pub total_deleted: u64,
}

/// 备份触发结果
#[derive(Serialize, ToSchema)]
pub struct BackupTriggerResult {
    /// "started" 或 "already_running"
    pub status: String,
    /// 结果摘要
    pub message: String,
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
}
