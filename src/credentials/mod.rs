//! 跨账户凭证
//!
//! - [`CredentialBroker`]：assume role + 身份校验，返回只绑定新凭证的客户端
//! - [`LeaseCache`]：可选的按账户缓存层，复用前检查过期时间
//! - [`StsApi`] / [`RuntimeConnector`]：外部依赖注入点，测试可替换

pub mod broker;
pub mod cache;
pub mod sts;
pub mod types;

pub use broker::{CredentialBroker, CredentialLease, CredentialSource, UnavailableCredentialSource};
pub use cache::LeaseCache;
pub use sts::{DynRuntimeConnector, DynStsApi, RuntimeConnector, StsApi, StsError};
pub use types::{
    AssumeRoleRequest, AssumedCredentialSet, CallerIdentity, CrossAccountRole,
    DEFAULT_ROLE_ARN_TEMPLATE,
};
