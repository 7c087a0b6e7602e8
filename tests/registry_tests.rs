use std::io::Write;
use std::sync::Arc;

use agenthub::{
    format_agent_catalog, AgentRegistry, AgentType, FileRegistrySource, HubError, RegistryError,
    RegistryHandle,
};

const REGISTRY_JSON: &str = r#"[
  {
    "agent_id": "PEGHWIVI5Y",
    "alias_id": "TSTALIASID",
    "name": "Diet Coach",
    "description": "Answers nutrition questions",
    "capabilities": ["Meal planning", "Calorie estimates"],
    "domains": ["health"],
    "example_queries": ["What should I eat before a run?"]
  },
  {
    "agent_id": "W4KUBC2B6A",
    "alias_id": "IO1GTTHP0M",
    "account_id": "152864141302",
    "name": "Document Processor",
    "capabilities": ["Extract text"]
  },
  {
    "agent_id": "CORE000001",
    "alias_id": "DEFAULT",
    "agent_type": "agentcore",
    "agent_runtime_arn": "arn:aws:bedrock-agentcore:us-east-1:843074507558:runtime/doc-abc",
    "enabled": false
  }
]"#;

fn write_registry(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write registry");
    file
}

#[test]
fn loads_registry_file() {
    let file = write_registry(REGISTRY_JSON);
    let registry = AgentRegistry::load_path(file.path()).unwrap();

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.enabled_count(), 2);
    assert_eq!(registry.enabled_ids(), vec!["PEGHWIVI5Y", "W4KUBC2B6A"]);

    let processor = registry.resolve("W4KUBC2B6A").unwrap();
    assert_eq!(processor.alias_id(), "IO1GTTHP0M");
    assert_eq!(processor.account_id(), Some("152864141302"));
    assert_eq!(processor.capabilities(), ["Extract text"]);
    assert_eq!(processor.agent_type(), AgentType::BedrockAgent);
}

#[test]
fn disabled_and_unknown_agents_do_not_resolve() {
    let registry = AgentRegistry::from_json_str(REGISTRY_JSON).unwrap();
    assert!(matches!(registry.resolve("CORE000001"), Err(HubError::NotFound(_))));
    assert!(matches!(registry.resolve("NOPE"), Err(HubError::NotFound(_))));
}

#[test]
fn scalar_capabilities_rejected_with_field_name() {
    let err = AgentRegistry::from_json_str(
        r#"[{"agent_id": "W4KUBC2B6A", "alias_id": "IO1GTTHP0M", "capabilities": "Extract text"}]"#,
    )
    .unwrap_err();

    match &err {
        RegistryError::InvalidField {
            index,
            agent_id,
            field,
            ..
        } => {
            assert_eq!(*index, 0);
            assert_eq!(agent_id, "W4KUBC2B6A");
            assert_eq!(*field, "capabilities");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("capabilities"));
}

#[test]
fn alias_with_trailing_quote_rejected_at_load() {
    let err = AgentRegistry::from_json_str(
        r#"[{"agent_id": "W4KUBC2B6A", "alias_id": "IO1GTTHP0M\""}]"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidField { field: "alias_id", .. }
    ));
}

#[test]
fn short_account_id_rejected_at_load() {
    let err = AgentRegistry::from_json_str(
        r#"[{"agent_id": "W4KUBC2B6A", "alias_id": "IO1GTTHP0M", "account_id": "15286414"}]"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidField { field: "account_id", .. }
    ));
}

#[test]
fn agentcore_without_runtime_arn_rejected_at_load() {
    let err = AgentRegistry::from_json_str(
        r#"[{"agent_id": "CORE000001", "alias_id": "DEFAULT", "agent_type": "agentcore"}]"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidField { field: "agent_runtime_arn", .. }
    ));
}

#[test]
fn alias_with_path_delimiters_rejected_at_load() {
    let err = AgentRegistry::from_json_str(
        r#"[{"agent_id": "W4KUBC2B6A", "alias_id": "IO1GTTHP0M/../../sts"}]"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidField { field: "alias_id", .. }
    ));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AgentRegistry::load_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, RegistryError::Io(_)));
}

#[test]
fn catalog_lists_enabled_agents() {
    let registry = AgentRegistry::from_json_str(REGISTRY_JSON).unwrap();
    let catalog = format_agent_catalog(&registry);

    assert!(catalog.starts_with("Agent 1: Diet Coach"));
    assert!(catalog.contains("Capabilities: Meal planning, Calorie estimates"));
    assert!(catalog.contains("Agent 2: Document Processor"));
    assert!(!catalog.contains("CORE000001"));
}

#[tokio::test]
async fn refresh_picks_up_file_changes_and_keeps_snapshot_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agents.json");
    std::fs::write(&path, REGISTRY_JSON).unwrap();

    let handle = RegistryHandle::load(Arc::new(FileRegistrySource::new(path.clone())))
        .await
        .unwrap();
    assert_eq!(handle.snapshot().enabled_count(), 2);

    std::fs::write(&path, r#"[{"agent_id": "ONLYAGENT1", "alias_id": "ALIAS00001"}]"#).unwrap();
    assert_eq!(handle.refresh().await.unwrap(), 1);
    assert!(handle.snapshot().resolve("ONLYAGENT1").is_ok());

    std::fs::write(&path, r#"[{"agent_id": "BROKEN", "alias_id": ""}]"#).unwrap();
    assert!(handle.refresh().await.is_err());
    assert!(handle.snapshot().resolve("ONLYAGENT1").is_ok());
}
