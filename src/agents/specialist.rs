//! 专家智能体：单条指令的执行器
//!
//! 指令 -> 调 LLM -> 解析输出（纯文本回复或 JSON Tool Call）-> 执行工具并把 Observation
//! 写回对话 -> 下一轮，直到模型给出最终回复或达到步数上限。
//! 终止检测是事后检查：循环结束后看工具调用记录里是否出现过 end_conversation。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::tools::{tool_call_schema_json, ToolExecutor, END_CONVERSATION_TOOL};

/// LLM 返回的 Tool Call（简化 JSON：{"tool": "list_emails", "args": {...}}）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// 单步解析结果
#[derive(Debug, Clone)]
pub enum SpecialistStep {
    /// 直接回复用户
    Response(String),
    /// 需要执行工具
    ToolCall(ToolCall),
}

/// 解析专家输出：若含有效 JSON 且 tool 非空则为 ToolCall，否则为 Response
pub fn parse_specialist_output(output: &str) -> Result<SpecialistStep, AgentError> {
    let trimmed = output.trim();

    // 尝试提取 JSON 块（```json ... ``` 或纯 JSON）
    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or_else(|| rest.trim())
    } else if let Some(start) = trimmed.find('{') {
        match trimmed.rfind('}') {
            Some(end) if end > start => &trimmed[start..=end],
            _ => return Ok(SpecialistStep::Response(trimmed.to_string())),
        }
    } else {
        return Ok(SpecialistStep::Response(trimmed.to_string()));
    };

    let parsed: ToolCall = serde_json::from_str(json_str)
        .map_err(|e| AgentError::JsonParseError(format!("{}: {}", e, json_str)))?;

    if parsed.tool.is_empty() {
        Ok(SpecialistStep::Response(trimmed.to_string()))
    } else {
        Ok(SpecialistStep::ToolCall(parsed))
    }
}

/// 专家一次运行的产出：回复文本、按序的工具调用名、是否请求终止会话
#[derive(Debug, Clone)]
pub struct SpecialistOutcome {
    pub response_text: String,
    pub tool_calls: Vec<String>,
    pub terminate_requested: bool,
}

/// 专家智能体：一个域限定的 LLM 会话 + 该域的工具执行器
pub struct SpecialistAgent {
    name: String,
    llm: Arc<dyn LlmClient>,
    executor: ToolExecutor,
    system_prompt: String,
    max_steps: usize,
}

impl SpecialistAgent {
    pub fn new(
        name: impl Into<String>,
        llm: Arc<dyn LlmClient>,
        executor: ToolExecutor,
        base_prompt: &str,
        max_steps: usize,
    ) -> Self {
        // 工具目录与调用格式拼进 system prompt，专家只见得到自己域内的工具
        let system_prompt = format!(
            "{}\n\n## Available tools\n{}\n\nTo use a tool, output ONLY one JSON object matching this schema (no other text):\n{}\n\nWhen you are done, reply to the user in plain text without braces.",
            base_prompt,
            executor.prompt_directory(),
            tool_call_schema_json(),
        );
        Self {
            name: name.into(),
            llm,
            executor,
            system_prompt,
            max_steps,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 执行一条（可能已拆解的）指令。
    /// context 是调用方裁剪好的最近消息窗口；取消只在步边界检查。
    pub async fn run(
        &self,
        instruction: &str,
        context: &[Message],
        cancel: &CancellationToken,
    ) -> Result<SpecialistOutcome, AgentError> {
        let mut messages: Vec<Message> = context.to_vec();
        messages.push(Message::user(instruction.to_string()));

        let mut tool_calls: Vec<String> = Vec::new();
        let mut last_output = String::new();

        for step in 0..self.max_steps {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            let mut full = vec![Message::system(self.system_prompt.clone())];
            full.extend(messages.iter().cloned());
            let output = self
                .llm
                .complete(&full)
                .await
                .map_err(AgentError::LlmError)?;
            last_output = output.clone();

            match parse_specialist_output(&output) {
                Ok(SpecialistStep::Response(text)) => {
                    return Ok(self.finish(text, tool_calls));
                }
                Ok(SpecialistStep::ToolCall(call)) => {
                    if !self.executor.contains(&call.tool) {
                        tracing::warn!(
                            agent = %self.name,
                            tool = %call.tool,
                            "model called unregistered tool"
                        );
                        messages.push(Message::user(format!(
                            "Tool \"{}\" does not exist. Valid tools: {}.",
                            call.tool,
                            self.executor.tool_names().join(", ")
                        )));
                        continue;
                    }

                    tracing::info!(agent = %self.name, tool = %call.tool, step, "tool call");
                    tool_calls.push(call.tool.clone());
                    let observation = match self.executor.execute(&call.tool, call.args).await {
                        Ok(result) => result,
                        // 工具失败不是致命错误：作为 Observation 喂回，模型可以改口或报告
                        Err(e) => format!("Error: {}", e),
                    };

                    messages.push(Message::assistant(format!(
                        "Tool call: {} | Result: {}",
                        call.tool, observation
                    )));
                    messages.push(Message::user(format!(
                        "Observation from {}: {}",
                        call.tool, observation
                    )));
                }
                Err(AgentError::JsonParseError(detail)) => {
                    // 格式错误让模型自己修：注入提醒再试一轮
                    messages.push(Message::user(format!(
                        "Your last output was not a valid tool call ({}). Output exactly one {{\"tool\": \"...\", \"args\": {{...}}}} object, or answer in plain text without braces.",
                        detail
                    )));
                }
                Err(e) => return Err(e),
            }
        }

        let response = if last_output.is_empty() {
            "I could not complete the instruction within the step limit.".to_string()
        } else {
            format!(
                "Reached the tool step limit ({}). Last model output:\n{}",
                self.max_steps, last_output
            )
        };
        Ok(self.finish(response, tool_calls))
    }

    /// 事后检查工具调用记录，决定 terminate_requested
    fn finish(&self, response_text: String, tool_calls: Vec<String>) -> SpecialistOutcome {
        let terminate_requested = tool_calls.iter().any(|t| t == END_CONVERSATION_TOOL);
        SpecialistOutcome {
            response_text,
            tool_calls,
            terminate_requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;
    use crate::tools::{EndConversationTool, Tool, ToolRegistry};
    use async_trait::async_trait;

    struct PingTool;

    #[async_trait]
    impl Tool for PingTool {
        fn name(&self) -> &str {
            "ping"
        }

        fn description(&self) -> &str {
            "Replies pong. Args: {}"
        }

        async fn execute(&self, _args: serde_json::Value) -> Result<String, String> {
            Ok("pong".to_string())
        }
    }

    fn agent_with(llm: Arc<ScriptedLlmClient>) -> SpecialistAgent {
        let mut registry = ToolRegistry::new();
        registry.register(PingTool);
        registry.register(EndConversationTool);
        SpecialistAgent::new(
            "test",
            llm,
            ToolExecutor::new(registry, 5),
            "You are a test agent.",
            4,
        )
    }

    #[test]
    fn parse_plain_text_is_response() {
        assert!(matches!(
            parse_specialist_output("All done, no tools needed."),
            Ok(SpecialistStep::Response(_))
        ));
    }

    #[test]
    fn parse_fenced_tool_call() {
        let out = "```json\n{\"tool\": \"ping\", \"args\": {}}\n```";
        assert!(matches!(
            parse_specialist_output(out),
            Ok(SpecialistStep::ToolCall(tc)) if tc.tool == "ping"
        ));
    }

    #[test]
    fn parse_bad_json_is_error() {
        assert!(matches!(
            parse_specialist_output("{\"tool\": \"ping\", "),
            Err(AgentError::JsonParseError(_))
        ));
    }

    #[tokio::test]
    async fn run_executes_tool_then_responds() {
        let llm = Arc::new(ScriptedLlmClient::new([
            r#"{"tool": "ping", "args": {}}"#,
            "pong received, all good",
        ]));
        let agent = agent_with(llm);
        let outcome = agent
            .run("ping please", &[], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.response_text, "pong received, all good");
        assert_eq!(outcome.tool_calls, vec!["ping"]);
        assert!(!outcome.terminate_requested);
    }

    #[tokio::test]
    async fn end_conversation_sets_terminate_flag() {
        let llm = Arc::new(ScriptedLlmClient::new([
            r#"{"tool": "end_conversation", "args": {}}"#,
            "Goodbye!",
        ]));
        let agent = agent_with(llm);
        let outcome = agent
            .run("bye", &[], &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.terminate_requested);
        assert_eq!(outcome.tool_calls, vec![END_CONVERSATION_TOOL]);
    }

    #[tokio::test]
    async fn unknown_tool_gets_correction_and_recovers() {
        let llm = Arc::new(ScriptedLlmClient::new([
            r#"{"tool": "teleport", "args": {}}"#,
            "sorry, answering directly instead",
        ]));
        let agent = agent_with(llm.clone());
        let outcome = agent
            .run("do something", &[], &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.tool_calls.is_empty());
        assert_eq!(outcome.response_text, "sorry, answering directly instead");
        // 第二次调用的上下文里应有纠正提示
        let calls = llm.recorded_calls();
        assert!(calls[1].iter().any(|m| m.contains("does not exist")));
    }

    #[tokio::test]
    async fn step_cap_returns_last_output() {
        let llm = Arc::new(ScriptedLlmClient::new([
            r#"{"tool": "ping", "args": {}}"#,
            r#"{"tool": "ping", "args": {}}"#,
            r#"{"tool": "ping", "args": {}}"#,
            r#"{"tool": "ping", "args": {}}"#,
        ]));
        let agent = agent_with(llm);
        let outcome = agent
            .run("loop forever", &[], &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.response_text.contains("step limit"));
        assert_eq!(outcome.tool_calls.len(), 4);
    }

    #[tokio::test]
    async fn cancelled_token_aborts_before_llm() {
        let llm = Arc::new(ScriptedLlmClient::new(["never used"]));
        let agent = agent_with(llm);
        let token = CancellationToken::new();
        token.cancel();
        let err = agent.run("anything", &[], &token).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
    }
}
