//! 会话状态
//!
//! ConversationState 由控制回路独占持有：节点函数在一轮内修改它，专家智能体
//! 只拿到裁剪后的上下文窗口与结果缓存，从不直接写状态。

use crate::memory::{ConversationMemory, Message};
use crate::routing::{AgentType, ExecutionOrder, RoutingDecision};
use crate::store::{EmailSummary, EventSummary};

/// 单个会话的完整状态
#[derive(Clone, Debug)]
pub struct ConversationState {
    /// 对话历史（追加写，自动剪枝）
    pub messages: ConversationMemory,
    /// 本轮原始输入，每轮替换
    pub user_query: String,
    /// 默认 true；只有明确的终止信号会清掉
    pub continue_conversation: bool,
    /// 本轮路由结果（每轮由编排器设置一次）
    pub agent_type: AgentType,
    /// 仅 agent_type = Both 时有意义
    pub execution_order: ExecutionOrder,
    /// 拆解后的子任务；未拆解时等于 user_query
    pub gmail_instruction: String,
    pub calendar_instruction: String,
    /// 两个域最近一次取回的结果集（序号引用的解析依据）
    pub emails: Vec<EmailSummary>,
    pub events: Vec<EventSummary>,
    /// 已完成的轮数（诊断用）
    pub turn_count: usize,
}

impl ConversationState {
    pub fn new(max_context_turns: usize) -> Self {
        Self {
            messages: ConversationMemory::new(max_context_turns),
            user_query: String::new(),
            continue_conversation: true,
            agent_type: AgentType::Orchestrator,
            execution_order: ExecutionOrder::GmailFirst,
            gmail_instruction: String::new(),
            calendar_instruction: String::new(),
            emails: Vec::new(),
            events: Vec::new(),
            turn_count: 0,
        }
    }

    /// 把路由决策写入状态（每轮一次）
    pub fn apply_decision(&mut self, decision: &RoutingDecision) {
        self.agent_type = decision.agent_type;
        self.execution_order = decision.execution_order;
        self.gmail_instruction = decision.gmail_instruction.clone();
        self.calendar_instruction = decision.calendar_instruction.clone();
    }

    /// 给 LLM 的最近消息窗口
    pub fn recent_context(&self, window: usize) -> Vec<Message> {
        self.messages.recent(window).to_vec()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_decision_fills_all_routing_fields() {
        let mut state = ConversationState::new(10);
        let decision = RoutingDecision {
            agent_type: AgentType::Both,
            reasoning: String::new(),
            execution_order: ExecutionOrder::CalendarFirst,
            gmail_instruction: "email it".into(),
            calendar_instruction: "list events".into(),
        };
        state.apply_decision(&decision);
        assert_eq!(state.agent_type, AgentType::Both);
        assert_eq!(state.execution_order, ExecutionOrder::CalendarFirst);
        assert_eq!(state.gmail_instruction, "email it");
        assert_eq!(state.calendar_instruction, "list events");
    }
}
