use super::AgentRegistry;

const MAX_EXAMPLES: usize = 3;
const MAX_DESCRIPTION_CHARS: usize = 100;

/// 生成 agent 目录文本，供路由提示词或 UI 展示使用
pub fn format_agent_catalog(registry: &AgentRegistry) -> String {
    let entries: Vec<String> = registry
        .enabled()
        .enumerate()
        .map(|(i, agent)| {
            let examples: Vec<&str> = agent
                .example_queries()
                .iter()
                .take(MAX_EXAMPLES)
                .map(String::as_str)
                .collect();
            format!(
                "Agent {}: {}\n  ID: {}\n  Description: {}\n  Capabilities: {}\n  Domains: {}\n  Examples: {}",
                i + 1,
                agent.display_name(),
                agent.agent_id(),
                agent.description().unwrap_or("No description"),
                agent.capabilities().join(", "),
                agent.domains().join(", "),
                examples.join(", "),
            )
        })
        .collect();

    if entries.is_empty() {
        return "No agents available.".to_string();
    }
    entries.join("\n\n")
}

pub fn list_available_agents(registry: &AgentRegistry) -> String {
    if registry.enabled_count() == 0 {
        return "No agents registered.".to_string();
    }

    let mut lines = vec!["Available assistants:\n".to_string()];
    for agent in registry.enabled() {
        let description: String = agent
            .description()
            .unwrap_or("No description")
            .chars()
            .take(MAX_DESCRIPTION_CHARS)
            .collect();
        lines.push(format!("- {}: {}", agent.display_name(), description));
    }
    lines.join("\n")
}
