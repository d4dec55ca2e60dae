//! 会话流集成测试
//!
//! 用脚本化 Mock LLM 驱动真实的图执行器：路由 -> 专家 -> 工具 -> 回环/终止。
//! 执行严格串行，所以一份按时间序排列的脚本就能覆盖编排器与两个专家的全部调用。

use std::sync::Arc;

use magpie::config::AppConfig;
use magpie::core::AppContext;
use magpie::graph::ConversationRunner;
use magpie::llm::ScriptedLlmClient;
use magpie::routing::AgentType;
use magpie::store::{
    CalendarStore, InMemoryCalendarStore, InMemoryContactStore, InMemoryEmailStore,
};

struct Harness {
    runner: ConversationRunner,
    llm: Arc<ScriptedLlmClient>,
    email_store: Arc<InMemoryEmailStore>,
    calendar_store: Arc<InMemoryCalendarStore>,
}

fn harness(script: &[&str]) -> Harness {
    let llm = Arc::new(ScriptedLlmClient::new(script.iter().copied()));
    let email_store = Arc::new(InMemoryEmailStore::with_sample_data());
    let calendar_store = Arc::new(InMemoryCalendarStore::with_sample_data());
    let ctx = AppContext::assemble(
        AppConfig::default(),
        llm.clone(),
        email_store.clone(),
        calendar_store.clone(),
        Arc::new(InMemoryContactStore::new()),
    );
    Harness {
        runner: ConversationRunner::new(Arc::new(ctx)),
        llm,
        email_store,
        calendar_store,
    }
}

const SESSION: &str = "test-session";

#[tokio::test]
async fn scenario_a_single_domain_gmail_turn() {
    let mut h = harness(&[
        r#"{"agent_type": "gmail", "reasoning": "emails", "gmail_instruction": "show unread emails"}"#,
        r#"{"tool": "list_unread", "args": {}}"#,
        "You have 2 unread emails: the quarterly report and a lunch invite.",
    ]);

    let result = h.runner.run_turn(SESSION, "Show me my unread emails").await;

    assert!(!result.terminated);
    assert_eq!(result.replies.len(), 1);
    assert!(result.replies[0].contains("2 unread"));
    // 本轮的工具调用序列向外暴露（审计/遥测）
    assert_eq!(result.tool_calls, vec!["list_unread".to_string()]);

    let state = h.runner.session(SESSION).unwrap();
    assert_eq!(state.agent_type, AgentType::Gmail);
    assert!(state.continue_conversation);
    // 未读列表折回状态，供后续序号引用
    assert_eq!(state.emails.len(), 2);
    assert_eq!(state.turn_count, 1);
    assert_eq!(h.llm.remaining(), 0);
}

#[tokio::test]
async fn scenario_b_both_calendar_first_threads_context() {
    let mut h = harness(&[
        r#"{"agent_type": "both", "reasoning": "gmail needs calendar data",
            "execution_order": "calendar_first",
            "calendar_instruction": "find all calendar events in the next 2 weeks",
            "gmail_instruction": "send me an email summarizing the calendar events"}"#,
        r#"{"tool": "list_events", "args": {"days": 14}}"#,
        "Upcoming events: Team standup, Design review, 1:1 with manager.",
        r#"{"tool": "send_email", "args": {"to": "me@example.com", "subject": "Your events", "body": "Standup, design review, 1:1"}}"#,
        "I've emailed you a summary of your upcoming events.",
    ]);

    let result = h
        .runner
        .run_turn(
            SESSION,
            "find my calendar events for next 2 weeks and email me a summary",
        )
        .await;

    assert!(!result.terminated);
    // 日历先行，Gmail 在后，顺序即回复顺序
    assert_eq!(result.replies.len(), 2);
    assert!(result.replies[0].contains("Upcoming events"));
    assert!(result.replies[1].contains("emailed"));
    assert_eq!(
        result.tool_calls,
        vec!["list_events".to_string(), "send_email".to_string()]
    );

    // Gmail 专家的上下文里必须能看到日历专家的产出
    let calls = h.llm.recorded_calls();
    assert_eq!(calls.len(), 5);
    let gmail_first_call = &calls[3];
    assert!(
        gmail_first_call
            .iter()
            .any(|m| m.contains("Team standup")),
        "gmail context must include the calendar output"
    );

    // 副作用：确实发出了一封邮件
    assert_eq!(h.email_store.outbox().len(), 1);
    assert_eq!(h.email_store.outbox()[0].to, "me@example.com");

    let state = h.runner.session(SESSION).unwrap();
    assert_eq!(state.events.len(), 3);
}

#[tokio::test]
async fn scenario_c_terminate_skips_specialists() {
    let mut h = harness(&[
        r#"{"agent_type": "terminate", "reasoning": "user wants to exit"}"#,
    ]);

    let result = h.runner.run_turn(SESSION, "quit").await;

    assert!(result.terminated);
    assert_eq!(result.replies, vec!["Goodbye!".to_string()]);
    // 只有编排器被调用过
    assert_eq!(h.llm.recorded_calls().len(), 1);
    assert!(!h.runner.session(SESSION).unwrap().continue_conversation);
}

#[tokio::test]
async fn terminate_during_first_half_of_both_skips_second() {
    let mut h = harness(&[
        r#"{"agent_type": "both", "reasoning": "two ops", "execution_order": "gmail_first",
            "gmail_instruction": "say goodbye", "calendar_instruction": "list events"}"#,
        r#"{"tool": "end_conversation", "args": {}}"#,
        "Goodbye! Conversation closed.",
    ]);

    let result = h.runner.run_turn(SESSION, "wrap it up and stop").await;

    // 终止优先：日历专家（后半）不再执行
    assert!(result.terminated);
    assert_eq!(result.replies.len(), 1);
    assert_eq!(h.llm.recorded_calls().len(), 3);
    assert_eq!(h.llm.remaining(), 0);
}

#[tokio::test]
async fn specialist_failure_is_contained_and_session_continues() {
    // 脚本只有一条：编排器输出乱码 -> 默认决策路由到 Gmail；
    // Gmail 专家取脚本时已耗尽 -> LlmError -> 节点转为道歉式回复
    let mut h = harness(&["complete nonsense, no json here"]);

    let result = h.runner.run_turn(SESSION, "do something with my email").await;

    assert!(!result.terminated);
    assert_eq!(result.replies.len(), 1);
    assert!(result.replies[0].contains("Error processing request"));

    let state = h.runner.session(SESSION).unwrap();
    assert!(state.continue_conversation);
    // 默认决策：完整请求交给 Gmail
    assert_eq!(state.agent_type, AgentType::Gmail);
    assert_eq!(state.gmail_instruction, "do something with my email");

    // 错误也进了消息历史，下一轮照常进行
    let mut h2 = h;
    h2.llm.push(r#"{"agent_type": "orchestrator", "reasoning": "greeting"}"#);
    h2.llm.push("Hi! I'm still here.");
    let next = h2.runner.run_turn(SESSION, "are you still there?").await;
    assert_eq!(next.replies, vec!["Hi! I'm still here.".to_string()]);
}

#[tokio::test]
async fn scenario_d_ordinal_delete_resolves_against_cached_list() {
    let mut h = harness(&[
        // 第 1 轮：列出事件
        r#"{"agent_type": "calendar", "calendar_instruction": "list my events"}"#,
        r#"{"tool": "list_events", "args": {"days": 30}}"#,
        "You have 3 events coming up.",
        // 第 2 轮：删除第 2 个
        r#"{"agent_type": "calendar", "calendar_instruction": "delete the second event"}"#,
        r#"{"tool": "delete_event", "args": {"event_number": 2}}"#,
        "Deleted the second event.",
    ]);

    let first = h.runner.run_turn(SESSION, "what's on my calendar?").await;
    assert_eq!(first.replies.len(), 1);
    assert_eq!(h.runner.session(SESSION).unwrap().events.len(), 3);

    let second = h.runner.run_turn(SESSION, "delete the second event").await;
    assert!(!second.terminated);
    assert!(second.replies[0].contains("Deleted"));

    // 序号 2 -> 缓存下标 1 -> evt-2（样例事件按开始时间排序）
    assert!(h.calendar_store.get_event("evt-2").await.is_err());
    assert!(h.calendar_store.get_event("evt-1").await.is_ok());
    assert!(h.calendar_store.get_event("evt-3").await.is_ok());
}

#[tokio::test]
async fn ordinal_reference_survives_across_turns() {
    let mut h = harness(&[
        // 第 1 轮：列出收件箱
        r#"{"agent_type": "gmail", "gmail_instruction": "list my inbox"}"#,
        r#"{"tool": "list_emails", "args": {}}"#,
        "Listed 3 emails.",
        // 第 2 轮：读第 2 封（序号从上一轮折回的状态重新注入缓存）
        r#"{"agent_type": "gmail", "gmail_instruction": "read email 2"}"#,
        r#"{"tool": "read_email", "args": {"email_number": 2}}"#,
        "Email 2 is a lunch invitation from Bob.",
    ]);

    h.runner.run_turn(SESSION, "list my emails").await;
    let result = h.runner.run_turn(SESSION, "read the second email").await;
    assert!(result.replies[0].contains("lunch"));

    // 工具拿到的确实是第 2 封的内容（观察值出现在专家上下文里）
    let calls = h.llm.recorded_calls();
    let final_call = calls.last().unwrap();
    assert!(final_call.iter().any(|m| m.contains("Lunch tomorrow?")));
}

#[tokio::test]
async fn orchestrator_meta_question_needs_no_specialist() {
    let mut h = harness(&[
        r#"{"agent_type": "orchestrator", "reasoning": "asking about capabilities"}"#,
        "I route your requests to a Gmail agent and a Calendar agent.",
    ]);

    let result = h.runner.run_turn(SESSION, "what can you do?").await;

    assert!(!result.terminated);
    assert_eq!(result.replies.len(), 1);
    assert!(result.replies[0].contains("route"));
    // classify + respond 两次 LLM 调用，无专家参与
    assert_eq!(h.llm.recorded_calls().len(), 2);
}
