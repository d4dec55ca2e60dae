//! Agent 错误类型
//!
//! 控制回路是最后的错误边界：任何错误最终要么变成一条用户可见的回复，要么让会话进入 Terminated，
//! 绝不向上抛出导致进程退出。

use thiserror::Error;

use crate::store::RemoteApiError;

/// 会话运行过程中可能出现的错误（LLM、解析、工具、远端 API、序号越界等）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LlmError(String),

    /// 专家输出的 Tool Call JSON 无法解析（会以格式提醒让模型重试）
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    /// 模型调用了不存在的工具名
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Remote API error: {0}")]
    RemoteApi(#[from] RemoteApiError),

    /// 序号引用越界（「第 2 封邮件」但缓存里只有 1 封）
    #[error("Ordinal {index} out of range (list has {len} items)")]
    OrdinalOutOfRange { index: usize, len: usize },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Cancelled")]
    Cancelled,
}

impl AgentError {
    /// 转成一条面向用户的道歉式回复；错误细节保留，堆栈与协议层信息不外露
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Cancelled => "Request cancelled.".to_string(),
            AgentError::OrdinalOutOfRange { index, len } => format!(
                "Item {} is out of range - the last list only has {} entries. \
                 Please list again or pick a smaller number.",
                index, len
            ),
            other => format!("Error processing request: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_never_empty() {
        let errors = [
            AgentError::LlmError("boom".into()),
            AgentError::ToolTimeout("list_emails".into()),
            AgentError::OrdinalOutOfRange { index: 5, len: 3 },
            AgentError::Cancelled,
        ];
        for e in errors {
            assert!(!e.user_message().is_empty());
        }
    }

    #[test]
    fn ordinal_message_mentions_bounds() {
        let e = AgentError::OrdinalOutOfRange { index: 4, len: 2 };
        let msg = e.user_message();
        assert!(msg.contains('4') && msg.contains('2'));
    }
}
