/// 运行时要求的会话 ID 最小长度
pub const MIN_SESSION_ID_LEN: usize = 33;

/// 规范化会话 ID
///
/// - 缺失或为空：生成 `session-<20 位十六进制>`
/// - 短于 33 个字符：补 `-000…` 到 33 个字符
/// - 其它：原样保留
pub fn normalize_session_id(session_id: Option<&str>) -> String {
    let mut id = match session_id.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => id.to_string(),
        None => {
            let hex = uuid::Uuid::new_v4().simple().to_string();
            format!("session-{}", &hex[..20])
        }
    };

    let len = id.chars().count();
    if len < MIN_SESSION_ID_LEN {
        id.push('-');
        id.push_str(&"0".repeat(MIN_SESSION_ID_LEN - len - 1));
    }
    id
}
