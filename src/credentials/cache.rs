use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;

use super::broker::{CredentialLease, CredentialSource};
use crate::error::Result;

/// 默认提前刷新窗口
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 300;

/// 按目标账户缓存租约的凭证来源
///
/// 复用前检查 `expires_at`（含刷新窗口），过期即重新获取。锁只保护 map，
/// 获取凭证时不持锁。缓存实例由调用方持有并显式传入，不存在进程级单例。
pub struct LeaseCache {
    inner: Arc<dyn CredentialSource>,
    refresh_margin: Duration,
    leases: Mutex<HashMap<String, CredentialLease>>,
}

impl LeaseCache {
    pub fn new(inner: Arc<dyn CredentialSource>) -> Self {
        Self::with_refresh_margin(inner, Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS))
    }

    pub fn with_refresh_margin(inner: Arc<dyn CredentialSource>, refresh_margin: Duration) -> Self {
        Self {
            inner,
            refresh_margin,
            leases: Mutex::new(HashMap::new()),
        }
    }

    pub fn invalidate(&self, account_id: &str) {
        self.leases.lock().remove(account_id);
    }

    pub fn len(&self) -> usize {
        self.leases.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn usable(&self, account_id: &str) -> Option<CredentialLease> {
        let now = Utc::now();
        self.leases
            .lock()
            .get(account_id)
            .filter(|lease| lease.account_id() == account_id)
            .filter(|lease| lease.is_usable_at(now, self.refresh_margin))
            .cloned()
    }
}

#[async_trait]
impl CredentialSource for LeaseCache {
    async fn acquire(&self, target_account_id: &str) -> Result<CredentialLease> {
        if let Some(lease) = self.usable(target_account_id) {
            tracing::debug!(account = target_account_id, "reusing cached credential lease");
            return Ok(lease);
        }

        let lease = self.inner.acquire(target_account_id).await?;
        self.leases
            .lock()
            .insert(target_account_id.to_string(), lease.clone());
        Ok(lease)
    }
}
