//! 管理操作服务模块
//!
//! 所有管理操作先通过授权策略校验，再访问数据存储。

use std::sync::Arc;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::{Principal, SystemStatsSnapshot, TestRecordCounts};

use crate::backup::{BackupState, BackupStore};
use crate::stats::StatsAggregator;
use crate::store::DataStore;

/// 管理操作所需的角色
pub const ADMIN_ROLE: &str = "highboard";
/// 管理操作所需的部门
pub const ADMIN_DEPARTMENT: &str = "HR";

/// 授权策略接口，便于替换与测试
pub trait AdminPolicy: Send + Sync {
    /// 判断该主体是否允许执行管理操作
    fn authorize(&self, principal: &Principal) -> bool;
}

/// 基于角色与部门的默认策略
pub struct RolePolicy {
    role: String,
    department: String,
}

impl RolePolicy {
    pub fn new(role: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            department: department.into(),
        }
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::new(ADMIN_ROLE, ADMIN_DEPARTMENT)
    }
}

impl AdminPolicy for RolePolicy {
    fn authorize(&self, principal: &Principal) -> bool {
        principal.role == self.role
            && principal.department.as_deref() == Some(self.department.as_str())
    }
}

/// 测试数据清理结果
#[derive(Debug, Clone)]
pub struct CleanupReport {
    /// 清理前各类测试记录数
    pub before: TestRecordCounts,
    /// 实际删除的各类记录数
    pub deleted: TestRecordCounts,
    /// 删除总数
    pub total_deleted: u64,
}

/// 触发备份的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupTrigger {
    /// 备份任务已在后台启动
    Started,
    /// 已有备份任务在运行，未重复启动
    AlreadyRunning,
}

/// 管理操作服务：统计快照、测试数据清理、备份触发
pub struct AdminService {
    store: Arc<dyn DataStore>,
    backup: Arc<BackupStore>,
    policy: Arc<dyn AdminPolicy>,
    aggregator: StatsAggregator,
}

impl AdminService {
    /// 创建管理服务实例
    pub fn new(
        store: Arc<dyn DataStore>,
        backup: Arc<BackupStore>,
        policy: Arc<dyn AdminPolicy>,
        config: AppConfig,
    ) -> Self {
        let aggregator = StatsAggregator::new(store.clone(), backup.clone(), config);
        Self {
            store,
            backup,
            policy,
            aggregator,
        }
    }

    /// 授权校验，未通过时不进行任何存储访问
    fn authorize(&self, principal: &Principal) -> AppResult<()> {
        if self.policy.authorize(principal) {
            return Ok(());
        }
        tracing::warn!(user = %principal.name, role = %principal.role, "管理操作被拒绝");
        Err(AppError::PermissionDenied(
            "admin operations require elevated chapter role".to_string(),
        ))
    }

    /// 获取系统统计快照
    pub async fn get_stats(&self, principal: &Principal) -> AppResult<SystemStatsSnapshot> {
        self.authorize(principal)?;
        self.aggregator.compute_stats().await
    }

    /// 清理所有测试标记记录
    ///
    /// 各类记录的删除并发执行，彼此之间没有事务；部分失败会以 500 返回，
    /// 已删除的数据不回滚。
    pub async fn cleanup_test_data(&self, principal: &Principal) -> AppResult<CleanupReport> {
        self.authorize(principal)?;

        let before = self.store.test_record_counts().await?;
        let deleted = self.store.delete_test_records().await?;
        let total_deleted = deleted.total();

        tracing::info!(user = %principal.name, total_deleted, "测试数据清理完成");
        Ok(CleanupReport {
            before,
            deleted,
            total_deleted,
        })
    }

    /// 触发后台备份，立即返回，不等待完成
    pub fn trigger_backup(&self, principal: &Principal) -> AppResult<BackupTrigger> {
        self.authorize(principal)?;

        if *self.backup.status().borrow() == BackupState::Running {
            return Ok(BackupTrigger::AlreadyRunning);
        }

        let backup = self.backup.clone();
        tokio::spawn(async move {
            if let Err(e) = backup.run().await {
                tracing::error!(error = %e, "后台备份失败");
            }
        });

        tracing::info!(user = %principal.name, "备份任务已启动");
        Ok(BackupTrigger::Started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: &str, department: Option<&str>) -> Principal {
        Principal {
            id: "u1".to_string(),
            name: "Sara".to_string(),
            role: role.to_string(),
            department: department.map(String::from),
            is_test: false,
        }
    }

    #[test]
    fn test_role_policy_requires_role_and_department() {
        let policy = RolePolicy::default();
        assert!(policy.authorize(&principal("highboard", Some("HR"))));
        assert!(!policy.authorize(&principal("highboard", Some("Media"))));
        assert!(!policy.authorize(&principal("member", Some("HR"))));
        assert!(!policy.authorize(&principal("highboard", None)));
    }

    #[test]
    fn test_role_policy_is_swappable() {
        let policy = RolePolicy::new("board", "IT");
        assert!(policy.authorize(&principal("board", Some("IT"))));
        assert!(!policy.authorize(&principal("highboard", Some("HR"))));
    }
}
