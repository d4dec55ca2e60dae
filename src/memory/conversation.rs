//! 短期记忆：对话历史
//!
//! 保留最近 N 轮对话（user/assistant 对），超出时自动剪枝；
//! 构建 LLM 上下文时只取最近的一小段窗口（recent）。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 短期记忆：最近 N 轮对话（每轮含 user + assistant，故实际保留约 max_turns*2 条消息）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationMemory {
    messages: Vec<Message>,
    max_turns: usize,
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns,
        }
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
        self.prune();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// 最近 n 条消息（LLM 上下文窗口）；不足 n 条时返回全部
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// 超出 max_turns*2 时丢弃最旧的消息，保留最近部分
    fn prune(&mut self) {
        if self.messages.len() > self.max_turns * 2 {
            let keep = self.max_turns * 2;
            self.messages.drain(..self.messages.len() - keep);
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_returns_tail_window() {
        let mut mem = ConversationMemory::new(10);
        for i in 0..8 {
            mem.push(Message::user(format!("m{}", i)));
        }
        let recent = mem.recent(5);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].content, "m3");
        assert_eq!(recent[4].content, "m7");
    }

    #[test]
    fn recent_handles_short_history() {
        let mut mem = ConversationMemory::new(10);
        mem.push(Message::user("only"));
        assert_eq!(mem.recent(5).len(), 1);
    }

    #[test]
    fn prune_drops_oldest() {
        let mut mem = ConversationMemory::new(2);
        for i in 0..10 {
            mem.push(Message::user(format!("m{}", i)));
        }
        assert_eq!(mem.len(), 4);
        assert_eq!(mem.messages()[0].content, "m6");
    }
}
