//! 领域结果缓存：序号引用解析
//!
//! 每个域（邮件 / 日历）保留最近一次列表/搜索结果，供同会话内的
//! 「第 2 封邮件」「the second event」按 1 起始序号解析；越界是可报告的错误而非 panic。
//! 工具在执行中写入缓存，控制回路在每轮结束后把快照折回 ConversationState。

use std::sync::{Arc, RwLock};

use crate::core::AgentError;
use crate::store::types::{EmailSummary, EventSummary};

/// 按 1 起始的序号从列表中取元素
pub fn resolve_ordinal<T: Clone>(items: &[T], number: usize) -> Result<T, AgentError> {
    if number == 0 || number > items.len() {
        return Err(AgentError::OrdinalOutOfRange {
            index: number,
            len: items.len(),
        });
    }
    Ok(items[number - 1].clone())
}

/// 两个域的共享结果缓存；工具各持有一个克隆
#[derive(Clone, Default)]
pub struct ResultCache {
    emails: Arc<RwLock<Vec<EmailSummary>>>,
    events: Arc<RwLock<Vec<EventSummary>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_emails(&self, emails: Vec<EmailSummary>) {
        *self.emails.write().unwrap() = emails;
    }

    pub fn emails(&self) -> Vec<EmailSummary> {
        self.emails.read().unwrap().clone()
    }

    pub fn set_events(&self, events: Vec<EventSummary>) {
        *self.events.write().unwrap() = events;
    }

    pub fn events(&self) -> Vec<EventSummary> {
        self.events.read().unwrap().clone()
    }

    /// 解析「第 number 封邮件」
    pub fn resolve_email(&self, number: usize) -> Result<EmailSummary, AgentError> {
        resolve_ordinal(&self.emails.read().unwrap(), number)
    }

    /// 解析「第 number 个事件」
    pub fn resolve_event(&self, number: usize) -> Result<EventSummary, AgentError> {
        resolve_ordinal(&self.events.read().unwrap(), number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_bounds_one_indexed() {
        let items = vec!["a", "b", "c"];
        assert_eq!(resolve_ordinal(&items, 1).unwrap(), "a");
        assert_eq!(resolve_ordinal(&items, 3).unwrap(), "c");
        assert!(matches!(
            resolve_ordinal(&items, 0),
            Err(AgentError::OrdinalOutOfRange { index: 0, len: 3 })
        ));
        assert!(matches!(
            resolve_ordinal(&items, 4),
            Err(AgentError::OrdinalOutOfRange { index: 4, len: 3 })
        ));
    }

    #[test]
    fn ordinal_on_empty_list() {
        let items: Vec<&str> = Vec::new();
        assert!(matches!(
            resolve_ordinal(&items, 1),
            Err(AgentError::OrdinalOutOfRange { index: 1, len: 0 })
        ));
    }

    #[test]
    fn cache_roundtrip() {
        use chrono::Utc;
        let cache = ResultCache::new();
        cache.set_emails(vec![EmailSummary {
            id: "m1".into(),
            from: "a@b.c".into(),
            subject: "s".into(),
            snippet: String::new(),
            date: Utc::now(),
            unread: true,
            labels: Vec::new(),
        }]);
        assert_eq!(cache.resolve_email(1).unwrap().id, "m1");
        assert!(cache.resolve_email(2).is_err());
        assert!(cache.resolve_event(1).is_err());
    }
}
