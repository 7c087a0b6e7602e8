pub mod dispatcher;
pub mod request;

pub use dispatcher::{check_invocable, Dispatcher};
pub use request::{InvocationRequest, Route};

/// 超时后返回给用户的提示：远端可能仍在处理
pub const PROCESSING_MESSAGE: &str =
    "Your request is still being processed. The agent may still complete it; please check back shortly.";
