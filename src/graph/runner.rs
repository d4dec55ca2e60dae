//! 图执行器：单轮排序
//!
//! 从 UserInput 起步，按 ConversationGraph 的条件转移依次执行节点，
//! 回到 UserInput（等待下一条输入）或到达 End（会话终止）时收束本轮。
//! 一个会话同一时刻只有一个节点在执行；both 的两半严格串行。

use std::sync::Arc;

use crate::core::AppContext;
use crate::graph::builder::{ConversationGraph, GraphNode};
use crate::graph::nodes::{
    calendar_agent_node, gmail_agent_node, orchestrator_node, user_input_node,
};
use crate::memory::SessionStore;

/// 一轮的产出：按产生顺序的回复文本、本轮调用过的工具名（审计/遥测）与是否终止
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub replies: Vec<String>,
    pub tool_calls: Vec<String>,
    pub terminated: bool,
}

/// 会话执行器：持有应用上下文与会话存储
pub struct ConversationRunner {
    ctx: Arc<AppContext>,
    sessions: SessionStore,
}

impl ConversationRunner {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let sessions = SessionStore::new(ctx.config.app.max_context_turns);
        Self { ctx, sessions }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// 读取会话状态（测试与诊断用）
    pub fn session(&self, session_id: &str) -> Option<&crate::graph::ConversationState> {
        self.sessions.get(session_id)
    }

    /// 执行完整一轮：输入 -> 路由 -> 专家（一或两个）-> 等待输入或终止
    pub async fn run_turn(&mut self, session_id: &str, input: &str) -> TurnResult {
        let input = input.trim();
        if input.is_empty() {
            return TurnResult {
                replies: Vec::new(),
                tool_calls: Vec::new(),
                terminated: false,
            };
        }

        let state = self.sessions.get_or_create(session_id);
        let mut replies = Vec::new();
        let mut tool_calls = Vec::new();
        let mut node = ConversationGraph::entry();

        loop {
            match node {
                GraphNode::UserInput => user_input_node(state, input),
                GraphNode::Orchestrator => {
                    if let Some(reply) = orchestrator_node(&self.ctx, state).await {
                        replies.push(reply);
                    }
                }
                GraphNode::GmailAgent => {
                    let output = gmail_agent_node(&self.ctx, state).await;
                    replies.push(output.reply);
                    tool_calls.extend(output.tool_calls);
                }
                GraphNode::CalendarAgent => {
                    let output = calendar_agent_node(&self.ctx, state).await;
                    replies.push(output.reply);
                    tool_calls.extend(output.tool_calls);
                }
                GraphNode::End => break,
            }

            let next = ConversationGraph::next(node, state);
            if next == GraphNode::UserInput {
                // 本轮结束，挂起等待下一条输入
                state.turn_count += 1;
                return TurnResult {
                    replies,
                    tool_calls,
                    terminated: false,
                };
            }
            node = next;
        }

        state.turn_count += 1;
        TurnResult {
            replies,
            tool_calls,
            terminated: true,
        }
    }
}
