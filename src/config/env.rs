use crate::error::{HubError, Result};
use std::env;

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// 解析密钥类配置
    ///
    /// 优先级：
    /// 1. `${VAR_NAME}` 形式：读取对应环境变量
    /// 2. 空值：读取 `default_env_var`
    /// 3. 其它：原样使用
    pub fn resolve_secret_with(
        value: &str,
        default_env_var: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String> {
        let key = if value.starts_with("${") && value.ends_with('}') {
            &value[2..value.len() - 1]
        } else if value.is_empty() {
            default_env_var
        } else {
            return Ok(value.to_string());
        };
        lookup(key).ok_or_else(|| Self::missing(key))
    }

    /// 获取可选的环境变量（空字符串视为未设置）
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    fn missing(key: &str) -> HubError {
        HubError::Config(format!(
            "environment variable `{}` is not set; export it or add it to the service environment",
            key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_secret_direct() {
        let result = EnvConfig::resolve_secret_with("k3y-7f1c0a9e", "HUB_TEST_API_KEY", |_| None);
        assert_eq!(result.unwrap(), "k3y-7f1c0a9e");
    }

    #[test]
    fn test_resolve_secret_env_var() {
        let lookup =
            |key: &str| (key == "HUB_TEST_INDIRECT_KEY").then(|| "indirect_value".to_string());
        let result = EnvConfig::resolve_secret_with("${HUB_TEST_INDIRECT_KEY}", "FALLBACK_KEY", lookup);
        assert_eq!(result.unwrap(), "indirect_value");
    }

    #[test]
    fn test_get_env_optional_treats_blank_as_unset() {
        env::set_var("HUB_TEST_BLANK_VALUE", "  ");
        assert_eq!(EnvConfig::get_env_optional("HUB_TEST_BLANK_VALUE"), None);
        env::remove_var("HUB_TEST_BLANK_VALUE");
    }

    #[test]
    fn test_resolve_secret_default() {
        let lookup = |key: &str| (key == "HUB_DEFAULT_KEY").then(|| "default_value".to_string());
        let result = EnvConfig::resolve_secret_with("", "HUB_DEFAULT_KEY", lookup);
        assert_eq!(result.unwrap(), "default_value");
    }

    #[test]
    fn test_missing_variable() {
        let err = EnvConfig::resolve_secret_with("${NOT_THERE}", "X", |_| None).unwrap_err();
        assert!(err.to_string().contains("NOT_THERE"));
    }
}
