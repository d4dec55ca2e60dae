//! 路由决策协议
//!
//! 编排器的输出是不可信的外部输入：先从自由文本中取出 JSON 片段，再做严格的
//! schema 反序列化；任何一步失败都降级为安全默认决策（gmail + 原始请求），
//! 只记 warn 不向用户暴露。

use serde::{Deserialize, Serialize};

/// 本轮由谁处理
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Gmail,
    Calendar,
    Both,
    /// 关于系统自身的元问题，由编排器直接回答
    Orchestrator,
    /// 用户明确要求退出
    Terminate,
}

/// both 任务的执行顺序（先跑的一方产出数据给后跑的一方）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOrder {
    GmailFirst,
    CalendarFirst,
}

impl ExecutionOrder {
    pub fn first(&self) -> AgentType {
        match self {
            Self::GmailFirst => AgentType::Gmail,
            Self::CalendarFirst => AgentType::Calendar,
        }
    }

    pub fn second(&self) -> AgentType {
        match self {
            Self::GmailFirst => AgentType::Calendar,
            Self::CalendarFirst => AgentType::Gmail,
        }
    }
}

/// 归一化后的路由决策（字段永远填满，下游不需要再判空）
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoutingDecision {
    pub agent_type: AgentType,
    /// 诊断用，不影响行为
    pub reasoning: String,
    pub execution_order: ExecutionOrder,
    pub gmail_instruction: String,
    pub calendar_instruction: String,
}

/// 编排器 JSON 的原始形态（除 agent_type 外都可缺省）
#[derive(Deserialize)]
struct RawRoutingDecision {
    agent_type: AgentType,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    execution_order: Option<ExecutionOrder>,
    #[serde(default)]
    gmail_instruction: Option<String>,
    #[serde(default)]
    calendar_instruction: Option<String>,
}

/// 从自由文本中取 JSON 片段：```json 围栏优先，否则第一个 '{' 到最后一个 '}'
fn extract_json_span(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        let inner = match rest.find("```") {
            Some(end) => &rest[..end],
            None => rest,
        };
        return Some(inner.trim());
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&trimmed[start..=end])
}

fn non_empty(s: Option<String>, default: &str) -> String {
    match s {
        Some(s) if !s.trim().is_empty() => s,
        _ => default.to_string(),
    }
}

impl RoutingDecision {
    /// 安全默认：无法理解编排器输出时，把完整请求交给 Gmail 专家
    pub fn fallback(user_query: &str) -> Self {
        Self {
            agent_type: AgentType::Gmail,
            reasoning: "orchestrator output unparseable, defaulting to gmail".to_string(),
            execution_order: ExecutionOrder::GmailFirst,
            gmail_instruction: user_query.to_string(),
            calendar_instruction: user_query.to_string(),
        }
    }

    /// 解析编排器输出；永不失败（失败即 fallback）
    pub fn parse(raw_output: &str, user_query: &str) -> Self {
        let Some(span) = extract_json_span(raw_output) else {
            tracing::warn!(
                output = raw_output,
                "routing output contains no JSON object, using default decision"
            );
            return Self::fallback(user_query);
        };

        match serde_json::from_str::<RawRoutingDecision>(span) {
            Ok(raw) => Self {
                agent_type: raw.agent_type,
                reasoning: raw.reasoning.unwrap_or_default(),
                execution_order: raw.execution_order.unwrap_or(ExecutionOrder::GmailFirst),
                gmail_instruction: non_empty(raw.gmail_instruction, user_query),
                calendar_instruction: non_empty(raw.calendar_instruction, user_query),
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    output = raw_output,
                    "routing output failed schema validation, using default decision"
                );
                Self::fallback(user_query)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_outputs_all_yield_exact_default() {
        let query = "show my unread emails";
        let cases = [
            "",
            "sorry, I can't help with that",
            "{not json at all",
            r#"{"agent_type": "weather"}"#,
            r#"{"reasoning": "missing agent_type"}"#,
            "}{",
        ];
        for raw in cases {
            let decision = RoutingDecision::parse(raw, query);
            assert_eq!(decision.agent_type, AgentType::Gmail, "case: {raw}");
            assert_eq!(decision.execution_order, ExecutionOrder::GmailFirst);
            assert_eq!(decision.gmail_instruction, query);
            assert_eq!(decision.calendar_instruction, query);
        }
    }

    #[test]
    fn parses_plain_json() {
        let raw = r#"{"agent_type": "calendar", "reasoning": "events", "calendar_instruction": "show meetings tomorrow"}"#;
        let decision = RoutingDecision::parse(raw, "what meetings do I have tomorrow?");
        assert_eq!(decision.agent_type, AgentType::Calendar);
        assert_eq!(decision.calendar_instruction, "show meetings tomorrow");
        // 未给出的 gmail_instruction 回填完整请求
        assert_eq!(
            decision.gmail_instruction,
            "what meetings do I have tomorrow?"
        );
    }

    #[test]
    fn parses_fenced_json_with_surrounding_prose() {
        let raw = "Sure! Here is the routing:\n```json\n{\"agent_type\": \"terminate\", \"reasoning\": \"user wants out\"}\n```\nLet me know.";
        let decision = RoutingDecision::parse(raw, "quit");
        assert_eq!(decision.agent_type, AgentType::Terminate);
    }

    #[test]
    fn parses_both_with_calendar_first() {
        let raw = r#"{
            "agent_type": "both",
            "reasoning": "gmail needs calendar data",
            "execution_order": "calendar_first",
            "calendar_instruction": "find events for the next 2 weeks",
            "gmail_instruction": "email a summary of the calendar events"
        }"#;
        let decision = RoutingDecision::parse(raw, "irrelevant");
        assert_eq!(decision.agent_type, AgentType::Both);
        assert_eq!(decision.execution_order, ExecutionOrder::CalendarFirst);
        assert_eq!(decision.execution_order.first(), AgentType::Calendar);
        assert_eq!(decision.execution_order.second(), AgentType::Gmail);
    }

    #[test]
    fn json_embedded_in_text_is_found() {
        let raw = r#"routing result: {"agent_type": "gmail", "gmail_instruction": "list inbox"} done"#;
        let decision = RoutingDecision::parse(raw, "q");
        assert_eq!(decision.agent_type, AgentType::Gmail);
        assert_eq!(decision.gmail_instruction, "list inbox");
    }
}
