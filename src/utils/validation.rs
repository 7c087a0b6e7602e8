use std::net::IpAddr;

/// 标识符与配置校验
pub struct IdentifierValidator;

impl IdentifierValidator {
    /// 校验远端调用使用的不透明标识符（agent_id / alias_id 等）
    ///
    /// 规则：
    /// - 不能为空
    /// - 不能包含控制字符
    /// - 不能包含引号（`"`、`'`、`` ` ``）
    /// - 首尾不能有空白
    ///
    /// 返回的错误文案不带字段名，由调用方补充上下文。
    pub fn validate_identifier(value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Err("must not be empty".to_string());
        }
        if value.trim() != value {
            return Err(format!("has leading or trailing whitespace: {:?}", value));
        }
        if let Some(c) = value.chars().find(|c| c.is_control()) {
            return Err(format!("contains control character {:?}: {:?}", c, value));
        }
        if let Some(c) = value.chars().find(|c| matches!(c, '"' | '\'' | '`')) {
            return Err(format!("contains quote character {:?}: {:?}", c, value));
        }
        Ok(())
    }

    /// 校验会作为 URL 路径段发送的标识符：在 [`Self::validate_identifier`] 之外
    /// 还不能包含 `/`、`?`、`#`、`%`
    pub fn validate_path_segment(value: &str) -> Result<(), String> {
        Self::validate_identifier(value)?;
        if let Some(c) = value.chars().find(|c| matches!(c, '/' | '?' | '#' | '%')) {
            return Err(format!("contains URL delimiter {:?}: {:?}", c, value));
        }
        Ok(())
    }

    /// 校验账户 ID（12 位数字）
    pub fn validate_account_id(value: &str) -> Result<(), String> {
        if value.len() != 12 || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("must be a 12-digit account id, got {:?}", value));
        }
        Ok(())
    }

    /// 校验 URL 格式
    ///
    /// 请求头里会带临时凭证，所以只接受 `https://`；`http://` 仅限回环地址。
    pub fn validate_url(url: &str) -> Result<(), String> {
        if url.is_empty() {
            return Err("URL must not be empty".to_string());
        }

        if url.starts_with("https://") {
            return Ok(());
        }
        match url.strip_prefix("http://") {
            Some(rest) if is_loopback_authority(rest) => Ok(()),
            Some(_) => Err(format!(
                "plain http:// is only allowed for loopback hosts, got {:?}",
                url
            )),
            None => Err(format!("URL must start with https://, got {:?}", url)),
        }
    }

    /// 校验 API Key
    pub fn validate_api_key(api_key: &str) -> Result<(), String> {
        if api_key.is_empty() {
            return Err("API key must not be empty".to_string());
        }

        if api_key.starts_with("your_") || api_key.starts_with("changeme") {
            return Err("API key looks like a placeholder".to_string());
        }

        Ok(())
    }
}

fn is_loopback_authority(rest: &str) -> bool {
    let authority = rest
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or("");
    let host_port = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);
    let host = match host_port.strip_prefix('[') {
        Some(bracketed) => bracketed.split(']').next().unwrap_or(""),
        None => host_port.split(':').next().unwrap_or(""),
    };

    host.eq_ignore_ascii_case("localhost")
        || host.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
}
