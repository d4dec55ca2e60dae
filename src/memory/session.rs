//! 会话存储：以会话 ID 为键的 ConversationState 快照
//!
//! 基础设计为进程内存储（进程重启即失效）；若需持久化可在外部替换实现。

use std::collections::HashMap;

use uuid::Uuid;

use crate::graph::ConversationState;

/// 进程内会话存储：get_or_create / get / remove
pub struct SessionStore {
    sessions: HashMap<String, ConversationState>,
    max_context_turns: usize,
}

impl SessionStore {
    pub fn new(max_context_turns: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            max_context_turns,
        }
    }

    /// 生成一个新的会话 ID
    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn get_or_create(&mut self, session_id: &str) -> &mut ConversationState {
        let max_turns = self.max_context_turns;
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationState::new(max_turns))
    }

    pub fn get(&self, session_id: &str) -> Option<&ConversationState> {
        self.sessions.get(session_id)
    }

    pub fn remove(&mut self, session_id: &str) -> Option<ConversationState> {
        self.sessions.remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_stable() {
        let mut store = SessionStore::new(20);
        let id = SessionStore::new_session_id();
        store.get_or_create(&id).user_query = "hello".to_string();
        assert_eq!(store.get_or_create(&id).user_query, "hello");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_drops_session() {
        let mut store = SessionStore::new(20);
        store.get_or_create("s1");
        assert!(store.remove("s1").is_some());
        assert!(store.get("s1").is_none());
    }
}
