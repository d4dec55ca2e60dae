//! 图节点函数
//!
//! 每个节点拿 AppContext（只读依赖）与 ConversationState（独占可变）跑一步。
//! 专家节点是单轮的错误边界：任何 AgentError 在这里变成道歉式回复，
//! continue_conversation 强制保持 true，会话继续。

use crate::core::AppContext;
use crate::graph::ConversationState;
use crate::routing::AgentType;

/// 接收用户输入：写入 user_query 并追加到历史
pub fn user_input_node(state: &mut ConversationState, input: &str) {
    state.user_query = input.to_string();
    state.push_user(input);
    tracing::debug!(turn = state.turn_count, query = input, "user input");
}

/// 编排器节点：分类 + 拆解；元问题与终止在这里直接产生回复
pub async fn orchestrator_node(
    ctx: &AppContext,
    state: &mut ConversationState,
) -> Option<String> {
    let context = state.recent_context(ctx.config.app.context_window);
    let decision = match ctx.orchestrator.classify(&state.user_query, &context).await {
        Ok(decision) => decision,
        Err(e) => {
            // LLM 本身不可用：这一轮以错误回复收场，会话不终止
            tracing::error!(error = %e, "orchestrator classify failed");
            let reply = e.user_message();
            state.agent_type = AgentType::Orchestrator;
            state.push_assistant(reply.clone());
            return Some(reply);
        }
    };

    tracing::info!(
        agent_type = ?decision.agent_type,
        execution_order = ?decision.execution_order,
        "routed"
    );
    state.apply_decision(&decision);

    match decision.agent_type {
        AgentType::Terminate => {
            state.continue_conversation = false;
            let reply = "Goodbye!".to_string();
            state.push_assistant(reply.clone());
            Some(reply)
        }
        AgentType::Orchestrator => {
            let reply = match ctx.orchestrator.respond(&state.user_query, &context).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "orchestrator respond failed");
                    e.user_message()
                }
            };
            state.push_assistant(reply.clone());
            Some(reply)
        }
        _ => None,
    }
}

/// 专家节点的产出：回复文本与本次调用的工具名（审计用）
pub struct SpecialistNodeOutput {
    pub reply: String,
    pub tool_calls: Vec<String>,
}

/// Gmail 专家节点
pub async fn gmail_agent_node(
    ctx: &AppContext,
    state: &mut ConversationState,
) -> SpecialistNodeOutput {
    run_specialist(ctx, state, AgentType::Gmail).await
}

/// Calendar 专家节点
pub async fn calendar_agent_node(
    ctx: &AppContext,
    state: &mut ConversationState,
) -> SpecialistNodeOutput {
    run_specialist(ctx, state, AgentType::Calendar).await
}

async fn run_specialist(
    ctx: &AppContext,
    state: &mut ConversationState,
    which: AgentType,
) -> SpecialistNodeOutput {
    let (agent, instruction) = match which {
        AgentType::Calendar => (&ctx.calendar_agent, state.calendar_instruction.clone()),
        _ => (&ctx.gmail_agent, state.gmail_instruction.clone()),
    };
    let instruction = if instruction.trim().is_empty() {
        state.user_query.clone()
    } else {
        instruction
    };

    // 专家通过共享缓存读写结果集；先用状态里的快照对齐缓存
    ctx.cache.set_emails(state.emails.clone());
    ctx.cache.set_events(state.events.clone());

    let context = state.recent_context(ctx.config.app.context_window);
    let cancel = ctx.supervisor.cancel_token();

    let (reply, tool_calls) = match agent.run(&instruction, &context, &cancel).await {
        Ok(outcome) => {
            tracing::info!(
                agent = agent.name(),
                tools = ?outcome.tool_calls,
                terminate = outcome.terminate_requested,
                "specialist done"
            );
            if outcome.terminate_requested {
                state.continue_conversation = false;
            }
            (outcome.response_text, outcome.tool_calls)
        }
        Err(e) => {
            // 单轮错误边界：转为用户可见消息，会话继续
            tracing::error!(agent = agent.name(), error = %e, "specialist failed");
            state.continue_conversation = true;
            (e.user_message(), Vec::new())
        }
    };

    // 专家只返回增量：缓存快照折回状态，供下一轮的序号引用
    state.emails = ctx.cache.emails();
    state.events = ctx.cache.events();

    state.push_assistant(reply.clone());
    SpecialistNodeOutput { reply, tool_calls }
}
