//! 编排器：意图分类与任务拆解
//!
//! 只路由不执行：没有任何工具绑定，输出要么是 RoutingDecision JSON（路由模式），
//! 要么是自然语言（直接回答模式，用于关于系统自身的元问题）。

use std::sync::Arc;

use crate::config::ProfileSection;
use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::routing::RoutingDecision;

/// 路由模式 system prompt 模板（{user_name} 由 profile 注入）
const ORCHESTRATOR_PROMPT: &str = r#"You are {user_name}'s intelligent orchestrator agent. You have TWO modes of operation:

MODE 1 - ROUTING MODE (default):
When you receive a regular user query, analyze it and respond with ONLY a JSON object.

MODE 2 - DIRECT RESPONSE MODE:
When you see the instruction "Answer this directly (not as JSON):", respond naturally and
conversationally WITHOUT any JSON formatting. Answer questions about yourself, your
capabilities, or the system; greet users; reference previous conversation context.

Available Agents:
1. Gmail Agent - email tasks: reading, searching, listing, sending, replying, drafts,
   labels, archiving/deleting, and the local contact cache.
2. Calendar Agent - calendar tasks: viewing events, scheduling, rescheduling, attendees,
   RSVP, reminders.

In ROUTING MODE respond with ONLY a JSON object in this exact format:
{
    "agent_type": "gmail" | "calendar" | "both" | "orchestrator" | "terminate",
    "reasoning": "your explanation",
    "execution_order": "gmail_first" | "calendar_first" (only if agent_type is "both"),
    "gmail_instruction": "instruction for the Gmail agent (only for "gmail" or "both")",
    "calendar_instruction": "instruction for the Calendar agent (only for "calendar" or "both")"
}

CRITICAL RULES FOR "both":
- Decompose the task into TWO separate instructions: gmail_instruction contains ONLY the
  email part, calendar_instruction contains ONLY the calendar part.
- Specify "execution_order":
  * "calendar_first" if Gmail needs calendar data (e.g. "email me my calendar events")
  * "gmail_first" if Calendar needs email data (e.g. "schedule a meeting with people from John's email")
  * default to "gmail_first" if neither depends on the other.

Rules:
- "gmail" if the request is ONLY about emails
- "calendar" if the request is ONLY about calendar/events
- "both" if it involves BOTH email and calendar operations
- "orchestrator" for questions about YOU, your capabilities, greetings, or anything needing no agent action
- "terminate" if the user wants to exit, quit, stop, or end the conversation

Examples:
User: "Show me my unread emails"
Response: {"agent_type": "gmail", "reasoning": "User wants to view emails", "gmail_instruction": "show unread emails"}

User: "what can you do"
Response: {"agent_type": "orchestrator", "reasoning": "User is asking about capabilities"}

User: "quit"
Response: {"agent_type": "terminate", "reasoning": "User wants to exit"}

User: "find my calendar events for next 2 weeks and email me a summary"
Response: {"agent_type": "both", "reasoning": "Gmail needs calendar data for the summary", "execution_order": "calendar_first", "calendar_instruction": "find all calendar events in the next 2 weeks", "gmail_instruction": "send me an email summarizing the calendar events for the next 2 weeks"}

In ROUTING MODE output ONLY the JSON object, no additional text."#;

const DIRECT_MODE_PREFIX: &str = "Answer this directly (not as JSON):";

/// 编排器：持有 LLM 与路由提示词
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, profile: &ProfileSection) -> Self {
        Self {
            llm,
            system_prompt: ORCHESTRATOR_PROMPT.replace("{user_name}", &profile.user_name),
        }
    }

    fn build_messages(&self, context: &[Message], user_content: String) -> Vec<Message> {
        let mut messages = vec![Message::system(self.system_prompt.clone())];
        messages.extend(context.iter().cloned());
        messages.push(Message::user(user_content));
        messages
    }

    /// 路由模式：分类 + 拆解。解析失败不外抛，内部降级为默认决策。
    pub async fn classify(
        &self,
        user_query: &str,
        context: &[Message],
    ) -> Result<RoutingDecision, AgentError> {
        let messages = self.build_messages(context, user_query.to_string());
        let raw = self
            .llm
            .complete(&messages)
            .await
            .map_err(AgentError::LlmError)?;
        let decision = RoutingDecision::parse(&raw, user_query);
        tracing::debug!(
            agent_type = ?decision.agent_type,
            reasoning = %decision.reasoning,
            "routing decision"
        );
        Ok(decision)
    }

    /// 直接回答模式：元问题、寒暄（agent_type = orchestrator 时走这里）
    pub async fn respond(
        &self,
        user_query: &str,
        context: &[Message],
    ) -> Result<String, AgentError> {
        let messages = self.build_messages(
            context,
            format!("{} {}", DIRECT_MODE_PREFIX, user_query),
        );
        self.llm
            .complete(&messages)
            .await
            .map_err(AgentError::LlmError)
    }
}
