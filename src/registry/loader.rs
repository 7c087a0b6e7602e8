use serde_json::{Map, Value};

use super::record::{AgentRecord, AgentRecordBuilder, AgentType};
use crate::error::RegistryError;

/// 把一条原始 JSON 记录解析为已校验的 [`AgentRecord`]
///
/// 形状不符合约定的字段（例如把 `capabilities` 存成单个字符串）会在这里直接失败，
/// 错误里带上字段名。
pub fn parse_record(index: usize, value: &Value) -> Result<AgentRecord, RegistryError> {
    let object = value
        .as_object()
        .ok_or(RegistryError::NotAnObject { index })?;

    let label = object
        .get("agent_id")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string();
    let fields = FieldReader {
        index,
        agent_id: &label,
        object,
    };

    let agent_id = fields.required_str("agent_id")?;
    let alias_id = fields.required_str("alias_id")?;
    let mut builder = AgentRecordBuilder::new(agent_id, alias_id);

    if let Some(raw) = fields.optional_str("agent_type")? {
        let agent_type = AgentType::parse(raw).ok_or_else(|| {
            fields.invalid(
                "agent_type",
                format!("must be one of `bedrock_agent`, `agentcore`, got {:?}", raw),
            )
        })?;
        builder = builder.agent_type(agent_type);
    }
    if let Some(account_id) = fields.optional_str("account_id")? {
        builder = builder.account_id(account_id);
    }
    if let Some(arn) = fields.optional_str("agent_runtime_arn")? {
        builder = builder.agent_runtime_arn(arn);
    }
    if let Some(actor_id) = fields.optional_str("actor_id")? {
        builder = builder.actor_id(actor_id);
    }
    for capability in fields.string_list("capabilities")? {
        builder = builder.capability(capability);
    }
    for domain in fields.string_list("domains")? {
        builder = builder.domain(domain);
    }
    for query in fields.string_list("example_queries")? {
        builder = builder.example_query(query);
    }
    if let Some(enabled) = fields.optional_bool("enabled")? {
        builder = builder.enabled(enabled);
    }
    if let Some(name) = fields.optional_str("name")? {
        builder = builder.name(name);
    }
    if let Some(description) = fields.optional_str("description")? {
        builder = builder.description(description);
    }

    builder.build_at(index)
}

struct FieldReader<'a> {
    index: usize,
    agent_id: &'a str,
    object: &'a Map<String, Value>,
}

impl<'a> FieldReader<'a> {
    fn invalid(&self, field: &'static str, reason: impl Into<String>) -> RegistryError {
        RegistryError::InvalidField {
            index: self.index,
            agent_id: self.agent_id.to_string(),
            field,
            reason: reason.into(),
        }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        match self.object.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn required_str(&self, field: &'static str) -> Result<&'a str, RegistryError> {
        self.optional_str(field)?
            .ok_or_else(|| self.invalid(field, "is required"))
    }

    fn optional_str(&self, field: &'static str) -> Result<Option<&'a str>, RegistryError> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(
                field,
                format!("must be a string, got {}", type_name(other)),
            )),
        }
    }

    fn optional_bool(&self, field: &'static str) -> Result<Option<bool>, RegistryError> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.invalid(
                field,
                format!("must be a boolean, got {}", type_name(other)),
            )),
        }
    }

    fn string_list(&self, field: &'static str) -> Result<Vec<&'a str>, RegistryError> {
        let items = match self.present(field) {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(self.invalid(
                    field,
                    format!("must be an array of strings, got {}", type_name(other)),
                ))
            }
        };

        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.as_str().ok_or_else(|| {
                    self.invalid(
                        field,
                        format!("item {} must be a string, got {}", idx, type_name(item)),
                    )
                })
            })
            .collect()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
