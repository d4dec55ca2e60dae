//! Mock LLM 客户端（用于测试与离线运行，无需 API）

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, Role};

/// Mock 客户端：以纯文本回显用户最后一条消息。
/// 未配置 API Key 时整个应用回退到它：路由解析失败会走默认决策，专家直接把回显当回复。
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(format!("(mock, no API key configured) You said: {}", last_user))
    }
}

/// 脚本化 Mock：按顺序吐出预置输出，并记录每次调用收到的完整消息内容，
/// 供集成测试驱动「路由 -> 专家 -> 工具」多步流程并断言上下文传递。
#[derive(Default)]
pub struct ScriptedLlmClient {
    outputs: Mutex<VecDeque<String>>,
    /// 每次 complete 收到的消息内容（role: content 扁平化），测试用
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedLlmClient {
    pub fn new(outputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 追加一条脚本输出
    pub fn push(&self, output: impl Into<String>) {
        self.outputs.lock().unwrap().push_back(output.into());
    }

    /// 所有调用的消息内容快照
    pub fn recorded_calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// 剩余未消费的脚本条数
    pub fn remaining(&self) -> usize {
        self.outputs.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        self.calls.lock().unwrap().push(
            messages
                .iter()
                .map(|m| format!("{:?}: {}", m.role, m.content))
                .collect(),
        );
        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| "scripted outputs exhausted".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_client_pops_in_order() {
        let client = ScriptedLlmClient::new(["one", "two"]);
        let messages = vec![Message::user("hi")];
        assert_eq!(client.complete(&messages).await.unwrap(), "one");
        assert_eq!(client.complete(&messages).await.unwrap(), "two");
        assert!(client.complete(&messages).await.is_err());
        assert_eq!(client.recorded_calls().len(), 3);
    }
}
