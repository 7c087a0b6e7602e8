/// 工具模块 - 日志初始化与标识符校验
pub mod logging;
pub mod validation;

pub use logging::LoggingConfig;
pub use validation::IdentifierValidator;
