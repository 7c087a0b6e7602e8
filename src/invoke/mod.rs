pub mod assemble;
pub mod client;
pub mod echo;
pub mod http;
pub mod types;

pub use assemble::{assemble_reply, normalize_agentcore_body};
pub use client::{DynInvocationClient, InvocationClient};
pub use echo::EchoInvocationClient;
pub use types::{AgentInvocation, AgentReply, ChunkStream, RemoteError, RemoteErrorKind};
