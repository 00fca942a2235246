//! 测试会话上下文
//!
//! 封装"这是哪一场测试、代表谁提交"这一信息

use std::fmt::Display;
use uuid::Uuid;

/// 测试会话上下文
///
/// 由调用方创建并持有，替代浏览器本地存储里的测试 ID。
#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 会话 ID，同时作为提交时的幂等键
    pub session_id: Uuid,

    /// 转发给结果服务的 bearer token（本模块不生成，只转发）
    pub bearer_token: Option<String>,

    /// 患者标识（仅用于日志显示）
    pub patient_ref: Option<String>,
}

impl SessionCtx {
    /// 创建新的会话上下文
    pub fn new(bearer_token: Option<String>, patient_ref: Option<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            bearer_token,
            patient_ref,
        }
    }

    /// 提交使用的幂等键
    pub fn idempotency_key(&self) -> String {
        self.session_id.to_string()
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.patient_ref {
            Some(patient) => write!(f, "[会话 #{} 患者 #{}]", self.session_id, patient),
            None => write!(f, "[会话 #{}]", self.session_id),
        }
    }
}
