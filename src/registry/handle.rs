use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::AgentRegistry;
use crate::error::Result;

/// 注册表数据源 trait
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn load(&self) -> Result<AgentRegistry>;
    fn describe(&self) -> String;
}

/// JSON 文件数据源
pub struct FileRegistrySource {
    path: PathBuf,
}

impl FileRegistrySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RegistrySource for FileRegistrySource {
    async fn load(&self) -> Result<AgentRegistry> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(crate::error::RegistryError::from)?;
        Ok(AgentRegistry::from_json_str(&content)?)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// 固定内容数据源（测试和内嵌场景）
pub struct StaticRegistrySource {
    registry: AgentRegistry,
}

impl StaticRegistrySource {
    pub fn new(registry: AgentRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl RegistrySource for StaticRegistrySource {
    async fn load(&self) -> Result<AgentRegistry> {
        Ok(self.registry.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// 注册表快照持有者
///
/// 每次调度取一份 `Arc` 快照后不再持锁；刷新只替换指针，进行中的调度继续使用旧快照。
pub struct RegistryHandle {
    source: Arc<dyn RegistrySource>,
    current: RwLock<Arc<AgentRegistry>>,
}

impl RegistryHandle {
    pub async fn load(source: Arc<dyn RegistrySource>) -> Result<Self> {
        let registry = source.load().await?;
        tracing::info!(
            source = %source.describe(),
            agents = registry.enabled_count(),
            "agent registry loaded"
        );
        Ok(Self {
            source,
            current: RwLock::new(Arc::new(registry)),
        })
    }

    pub fn snapshot(&self) -> Arc<AgentRegistry> {
        self.current.read().clone()
    }

    /// 从数据源重新加载；失败时保留旧快照并返回错误
    pub async fn refresh(&self) -> Result<usize> {
        let registry = match self.source.load().await {
            Ok(registry) => registry,
            Err(err) => {
                tracing::warn!(source = %self.source.describe(), error = %err, "registry refresh failed");
                return Err(err);
            }
        };
        let count = registry.enabled_count();
        *self.current.write() = Arc::new(registry);
        tracing::info!(agents = count, "agent registry refreshed");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn refresh_swaps_snapshot_and_keeps_old_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.json");
        fs::write(&path, r#"[{"agent_id": "A1", "alias_id": "B1"}]"#).unwrap();

        let handle = RegistryHandle::load(Arc::new(FileRegistrySource::new(&path)))
            .await
            .unwrap();
        let before = handle.snapshot();
        assert_eq!(before.enabled_count(), 1);

        fs::write(
            &path,
            r#"[{"agent_id": "A1", "alias_id": "B1"}, {"agent_id": "A2", "alias_id": "B2"}]"#,
        )
        .unwrap();
        assert_eq!(handle.refresh().await.unwrap(), 2);
        assert_eq!(handle.snapshot().enabled_count(), 2);
        assert_eq!(before.enabled_count(), 1);

        fs::write(&path, r#"[{"agent_id": "A1", "alias_id": "B1", "capabilities": "x"}]"#)
            .unwrap();
        assert!(handle.refresh().await.is_err());
        assert_eq!(handle.snapshot().enabled_count(), 2);
    }
}
