use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agenthub::utils::LoggingConfig;
use agenthub::{
    format_agent_catalog, AgentRegistry, Dispatcher, EchoInvocationClient, FileRegistrySource,
    HubConfig, HubState, InvocationRequest, RegistryHandle, UnavailableCredentialSource,
    PROCESSING_MESSAGE,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agenthub", version, about = "Agent hub dispatcher", author)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the chat HTTP endpoint
    Serve {
        #[arg(long)]
        registry: Option<PathBuf>,
        #[arg(long)]
        bind: Option<String>,
        /// Answer with the local echo client instead of the gateway
        #[arg(long)]
        echo: bool,
    },
    Agents {
        #[command(subcommand)]
        command: AgentsCommand,
    },
    /// Send one prompt to one agent and print the reply
    Invoke {
        #[arg(long)]
        registry: Option<PathBuf>,
        #[arg(long)]
        agent_id: String,
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        session_id: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        #[arg(long)]
        echo: bool,
    },
}

#[derive(Subcommand)]
enum AgentsCommand {
    List {
        #[arg(long)]
        registry: Option<PathBuf>,
    },
    Validate {
        #[arg(long)]
        registry: Option<PathBuf>,
    },
    Catalog {
        #[arg(long)]
        registry: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve {
            registry,
            bind,
            echo,
        } => handle_serve(registry, bind, echo).await?,
        Command::Agents { command } => match command {
            AgentsCommand::List { registry } => handle_agents_list(registry)?,
            AgentsCommand::Validate { registry } => handle_agents_validate(registry)?,
            AgentsCommand::Catalog { registry } => {
                println!("{}", format_agent_catalog(&load_registry(registry)?))
            }
        },
        Command::Invoke {
            registry,
            agent_id,
            prompt,
            session_id,
            timeout_secs,
            echo,
        } => {
            handle_invoke(registry, agent_id, prompt, session_id, timeout_secs, echo).await?
        }
    }
    Ok(())
}

fn registry_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| agenthub::EnvConfig::get_env_optional("AGENT_REGISTRY_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(agenthub::config::hub::DEFAULT_REGISTRY_PATH))
}

fn load_registry(flag: Option<PathBuf>) -> anyhow::Result<AgentRegistry> {
    let path = registry_path(flag);
    AgentRegistry::load_path(&path)
        .map_err(|e| anyhow::anyhow!("failed to load registry `{}`: {}", path.display(), e))
}

fn handle_agents_list(registry: Option<PathBuf>) -> anyhow::Result<()> {
    let registry = load_registry(registry)?;
    if registry.is_empty() {
        println!("No agents registered");
        return Ok(());
    }

    println!(
        "{:<14} {:<14} {:<14} {:<14} {:<8} {}",
        "Agent ID", "Alias", "Type", "Account", "Enabled", "Name"
    );
    for record in registry.records() {
        println!(
            "{:<14} {:<14} {:<14} {:<14} {:<8} {}",
            record.agent_id(),
            record.alias_id(),
            record.agent_type().as_str(),
            record.account_id().unwrap_or("(local)"),
            record.is_enabled(),
            record.display_name()
        );
    }
    Ok(())
}

fn handle_agents_validate(registry: Option<PathBuf>) -> anyhow::Result<()> {
    let registry = load_registry(registry)?;
    println!(
        "Registry OK: {} records, {} enabled",
        registry.len(),
        registry.enabled_count()
    );
    Ok(())
}

#[cfg(feature = "http-client")]
fn gateway_dispatcher(config: &HubConfig) -> anyhow::Result<Option<Dispatcher>> {
    use agenthub::{
        CredentialBroker, HttpInvocationClient, HttpRuntimeConnector, HttpStsClient, LeaseCache,
    };

    let url = match &config.gateway_url {
        Some(url) => url.clone(),
        None => return Ok(None),
    };
    let broker = CredentialBroker::new(
        config.local_account_id.clone(),
        config.role.clone(),
        Arc::new(HttpStsClient::new(url.clone())?),
        Arc::new(HttpRuntimeConnector::new(url.clone())?),
    );
    Ok(Some(Dispatcher::new(
        config.local_account_id.clone(),
        Arc::new(HttpInvocationClient::local(url)?),
        Arc::new(LeaseCache::new(Arc::new(broker))),
    )))
}

#[cfg(not(feature = "http-client"))]
fn gateway_dispatcher(_config: &HubConfig) -> anyhow::Result<Option<Dispatcher>> {
    Ok(None)
}

fn build_dispatcher(config: &HubConfig, echo: bool) -> anyhow::Result<Dispatcher> {
    if echo {
        tracing::warn!("echo mode: cross-account agents are unavailable");
        return Ok(Dispatcher::new(
            config.local_account_id.clone(),
            Arc::new(EchoInvocationClient::new("local-echo")),
            Arc::new(UnavailableCredentialSource),
        ));
    }
    gateway_dispatcher(config)?.ok_or_else(|| {
        anyhow::anyhow!(
            "no invocation backend: set HUB_GATEWAY_URL (build with `--features http-client`) or pass --echo"
        )
    })
}

async fn handle_serve(
    registry: Option<PathBuf>,
    bind: Option<String>,
    echo: bool,
) -> anyhow::Result<()> {
    let mut config = HubConfig::from_env()?;
    if let Some(path) = registry {
        config.registry_path = path;
    }
    if let Some(bind) = bind {
        config.bind = bind;
    }

    let registry =
        RegistryHandle::load(Arc::new(FileRegistrySource::new(config.registry_path.clone())))
            .await?;
    let state = Arc::new(HubState {
        registry,
        dispatcher: build_dispatcher(&config, echo)?,
        api_key: config.api_key.clone(),
        chat_timeout: config.chat_timeout,
        default_agent_id: config.default_agent_id.clone(),
    });
    if state.api_key.is_none() {
        tracing::warn!("HUB_API_KEY not set: chat endpoint is unauthenticated");
    }

    agenthub::server::serve(state, &config.bind).await
}

async fn handle_invoke(
    registry: Option<PathBuf>,
    agent_id: String,
    prompt: String,
    session_id: Option<String>,
    timeout_secs: Option<u64>,
    echo: bool,
) -> anyhow::Result<()> {
    let config = HubConfig::from_env()?;
    let registry = load_registry(registry.or_else(|| Some(config.registry_path.clone())))?;
    let record = registry.resolve(&agent_id)?;
    let dispatcher = build_dispatcher(&config, echo)?;

    let session_id = agenthub::server::normalize_session_id(session_id.as_deref());
    let deadline = timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(config.chat_timeout);
    let request = InvocationRequest::new(record, prompt, session_id.clone());

    match dispatcher.dispatch(&request, Some(deadline)).await {
        Ok(reply) => println!("{}", reply.into_display_text()),
        Err(err) if err.is_timeout() => println!("{PROCESSING_MESSAGE}"),
        Err(err) => return Err(err.into()),
    }
    tracing::debug!(session_id = %session_id, "invoke finished");
    Ok(())
}
