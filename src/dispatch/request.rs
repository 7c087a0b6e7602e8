use crate::registry::AgentRecord;

/// 一次用户请求；`session_id` 原样透传给远端
#[derive(Clone, Debug)]
pub struct InvocationRequest<'a> {
    pub record: &'a AgentRecord,
    pub user_text: String,
    pub session_id: String,
}

impl<'a> InvocationRequest<'a> {
    pub fn new(
        record: &'a AgentRecord,
        user_text: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            record,
            user_text: user_text.into(),
            session_id: session_id.into(),
        }
    }
}

/// 路由决策结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route<'a> {
    Local,
    CrossAccount(&'a str),
}
