//! Agent 注册表
//!
//! 注册表在加载时一次性完成校验，之后只读。调度器只通过 [`AgentRegistry::resolve`]
//! 查询记录，从不修改。

pub mod catalog;
pub mod handle;
pub mod loader;
pub mod record;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{HubError, RegistryError, Result};

pub use catalog::{format_agent_catalog, list_available_agents};
pub use handle::{FileRegistrySource, RegistryHandle, RegistrySource, StaticRegistrySource};
pub use loader::parse_record;
pub use record::{AgentRecord, AgentRecordBuilder, AgentType, DEFAULT_ACTOR_ID};

#[derive(Clone, Debug, Default)]
pub struct AgentRegistry {
    records: Vec<AgentRecord>,
    index: HashMap<String, usize>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(
        records: impl IntoIterator<Item = AgentRecord>,
    ) -> std::result::Result<Self, RegistryError> {
        let mut registry = Self::new();
        for record in records {
            if registry.index.contains_key(record.agent_id()) {
                return Err(RegistryError::Duplicate(record.agent_id().to_string()));
            }
            registry
                .index
                .insert(record.agent_id().to_string(), registry.records.len());
            registry.records.push(record);
        }
        Ok(registry)
    }

    pub fn from_values(values: &[Value]) -> std::result::Result<Self, RegistryError> {
        let records = values
            .iter()
            .enumerate()
            .map(|(index, value)| parse_record(index, value))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::from_records(records)
    }

    /// 从 JSON 文本加载
    ///
    /// 接受记录数组，或 DynamoDB scan 导出的 `{"Items": [...]}` 形状。
    pub fn from_json_str(content: &str) -> std::result::Result<Self, RegistryError> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| RegistryError::Parse(e.to_string()))?;
        match value {
            Value::Array(items) => Self::from_values(&items),
            Value::Object(mut object) => match object.remove("Items") {
                Some(Value::Array(items)) => Self::from_values(&items),
                _ => Err(RegistryError::Parse(
                    "expected an array of agent records or an object with `Items`".to_string(),
                )),
            },
            _ => Err(RegistryError::Parse(
                "expected an array of agent records".to_string(),
            )),
        }
    }

    pub fn load_path(path: impl AsRef<Path>) -> std::result::Result<Self, RegistryError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// 按 agent_id 查找可调度的记录；不存在或已禁用都返回 `NotFound`
    pub fn resolve(&self, agent_id: &str) -> Result<&AgentRecord> {
        self.index
            .get(agent_id)
            .map(|&idx| &self.records[idx])
            .filter(|record| record.is_enabled())
            .ok_or_else(|| HubError::NotFound(agent_id.to_string()))
    }

    pub fn enabled(&self) -> impl Iterator<Item = &AgentRecord> {
        self.records.iter().filter(|record| record.is_enabled())
    }

    pub fn records(&self) -> &[AgentRecord] {
        &self.records
    }

    pub fn enabled_ids(&self) -> Vec<&str> {
        self.enabled().map(AgentRecord::agent_id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
