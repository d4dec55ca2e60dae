//! 会话图：固定拓扑 + 条件转移
//!
//! 拓扑与转移规则：
//!   UserInput -> Orchestrator（有输入且会话未终止）| End
//!   Orchestrator -> GmailAgent | CalendarAgent（both 时按 execution_order 取先手）| UserInput | End
//!   GmailAgent / CalendarAgent -> 另一个专家（both 的后半）| UserInput | End
//! 终止优先：专家发出 terminate 后即使 both 的后半未跑也直接 End。

use crate::graph::ConversationState;
use crate::routing::{AgentType, ExecutionOrder};

/// 图节点
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphNode {
    UserInput,
    Orchestrator,
    GmailAgent,
    CalendarAgent,
    End,
}

/// 固定拓扑的会话图；next 依据状态决定条件转移
pub struct ConversationGraph;

impl ConversationGraph {
    pub fn entry() -> GraphNode {
        GraphNode::UserInput
    }

    /// 当前节点执行完后的下一个节点
    pub fn next(current: GraphNode, state: &ConversationState) -> GraphNode {
        match current {
            GraphNode::UserInput => {
                if state.continue_conversation {
                    GraphNode::Orchestrator
                } else {
                    GraphNode::End
                }
            }
            GraphNode::Orchestrator => match state.agent_type {
                AgentType::Terminate => GraphNode::End,
                AgentType::Orchestrator => GraphNode::UserInput,
                AgentType::Gmail => GraphNode::GmailAgent,
                AgentType::Calendar => GraphNode::CalendarAgent,
                AgentType::Both => match state.execution_order.first() {
                    AgentType::Calendar => GraphNode::CalendarAgent,
                    _ => GraphNode::GmailAgent,
                },
            },
            GraphNode::GmailAgent => {
                if !state.continue_conversation {
                    // 终止优先于 both 的后半
                    GraphNode::End
                } else if state.agent_type == AgentType::Both
                    && state.execution_order == ExecutionOrder::GmailFirst
                {
                    GraphNode::CalendarAgent
                } else {
                    GraphNode::UserInput
                }
            }
            GraphNode::CalendarAgent => {
                if !state.continue_conversation {
                    GraphNode::End
                } else if state.agent_type == AgentType::Both
                    && state.execution_order == ExecutionOrder::CalendarFirst
                {
                    GraphNode::GmailAgent
                } else {
                    GraphNode::UserInput
                }
            }
            GraphNode::End => GraphNode::End,
        }
    }

    /// Mermaid 拓扑图（启动时打印，方便核对图结构）
    pub fn mermaid() -> String {
        [
            "graph TD",
            "    START --> user_input",
            "    user_input -->|continue| orchestrator",
            "    user_input -->|end| END",
            "    orchestrator -->|gmail / both:gmail_first| gmail_agent",
            "    orchestrator -->|calendar / both:calendar_first| calendar_agent",
            "    orchestrator -->|direct answer| user_input",
            "    orchestrator -->|terminate| END",
            "    gmail_agent -->|both:gmail_first| calendar_agent",
            "    gmail_agent -->|continue| user_input",
            "    gmail_agent -->|terminate| END",
            "    calendar_agent -->|both:calendar_first| gmail_agent",
            "    calendar_agent -->|continue| user_input",
            "    calendar_agent -->|terminate| END",
        ]
        .join("\n")
    }
}
