pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod invoke;
pub mod registry;
pub mod server;
pub mod utils;

pub use config::{EnvConfig, HubConfig};
pub use credentials::{
    AssumeRoleRequest, AssumedCredentialSet, CallerIdentity, CredentialBroker, CredentialLease,
    CredentialSource, CrossAccountRole, LeaseCache, RuntimeConnector, StsApi, StsError,
    UnavailableCredentialSource,
};
pub use dispatch::{Dispatcher, InvocationRequest, Route, PROCESSING_MESSAGE};
pub use error::{AuthErrorKind, HubError, InvocationErrorKind, RegistryError, Result};
pub use invoke::{
    assemble_reply, AgentInvocation, AgentReply, ChunkStream, DynInvocationClient,
    EchoInvocationClient, InvocationClient, RemoteError, RemoteErrorKind,
};
#[cfg(feature = "http-client")]
pub use invoke::http::{HttpInvocationClient, HttpRuntimeConnector, HttpStsClient};
pub use registry::{
    format_agent_catalog, list_available_agents, AgentRecord, AgentRecordBuilder, AgentRegistry,
    AgentType, FileRegistrySource, RegistryHandle, RegistrySource, StaticRegistrySource,
};
pub use server::{build_router, HubState};
pub use utils::{logging, validation};
