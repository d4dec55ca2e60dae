//! Calendar 专家的装配：提示词 + 工具绑定

use std::sync::Arc;

use crate::agents::{load_prompt_override, render_profile, SpecialistAgent};
use crate::config::AppConfig;
use crate::llm::LlmClient;
use crate::store::{CalendarStore, ContactStore, ResultCache};
use crate::tools::calendar::{
    AttendeesTool, CreateEventTool, DeleteEventTool, GetCurrentTimeTool, GetEventTool,
    ListEventsTool, SetRemindersTool, SetRsvpTool, UpdateEventTimeTool,
};
use crate::tools::contacts::{AddContactTool, ListContactsTool, QueryContactsTool};
use crate::tools::{EndConversationTool, ToolExecutor, ToolRegistry};

pub const CALENDAR_AGENT_NAME: &str = "calendar";

/// 默认提示词；config/prompts/calendar.txt 存在时以文件为准
const CALENDAR_PROMPT: &str = r#"You are {user_name}'s personal calendar assistant. You respond and take actions as if you ARE {user_name} ({user_email}, timezone {timezone}).

Your capabilities: view upcoming events and their details; schedule new events; reschedule; add or remove attendees; delete events; update RSVP status; configure reminders.

ALWAYS call get_current_time before computing relative dates ("today", "tomorrow", "next week"). When the user mentions times without a timezone, assume {timezone} and convert to UTC for the tools.

When the user references events by number ("the second event"), use the number from the most recent list they have seen - do not re-query.

Attendee emails: look them up with query_contacts first; if not cached, ask the user.

Before deleting events or changing attendees, confirm with the user. These actions are visible to other people.

When the user wants to exit, quit, stop, or end the conversation, call the end_conversation tool.

Be conversational and helpful. Ask for clarification if needed."#;

/// 构建 Calendar 专家：域内工具 + 共享联系人查询 + 终止哨兵
pub fn create_calendar_agent(
    llm: Arc<dyn LlmClient>,
    calendar_store: Arc<dyn CalendarStore>,
    contact_store: Arc<dyn ContactStore>,
    cache: ResultCache,
    cfg: &AppConfig,
) -> SpecialistAgent {
    let mut tools = ToolRegistry::new();
    tools.register(GetCurrentTimeTool);
    tools.register(ListEventsTool::new(calendar_store.clone(), cache.clone()));
    tools.register(GetEventTool::new(calendar_store.clone(), cache.clone()));
    tools.register(CreateEventTool::new(calendar_store.clone()));
    tools.register(UpdateEventTimeTool::new(
        calendar_store.clone(),
        cache.clone(),
    ));
    tools.register(AttendeesTool::add(calendar_store.clone(), cache.clone()));
    tools.register(AttendeesTool::remove(calendar_store.clone(), cache.clone()));
    tools.register(DeleteEventTool::new(calendar_store.clone(), cache.clone()));
    tools.register(SetRsvpTool::new(calendar_store.clone(), cache.clone()));
    tools.register(SetRemindersTool::new(calendar_store, cache));

    tools.register(QueryContactsTool::new(contact_store.clone()));
    tools.register(AddContactTool::new(contact_store.clone()));
    tools.register(ListContactsTool::new(contact_store));

    tools.register(EndConversationTool);

    let prompt = load_prompt_override(CALENDAR_AGENT_NAME)
        .unwrap_or_else(|| CALENDAR_PROMPT.to_string());
    SpecialistAgent::new(
        CALENDAR_AGENT_NAME,
        llm,
        ToolExecutor::new(tools, cfg.tools.tool_timeout_secs),
        &render_profile(&prompt, &cfg.profile),
        cfg.tools.max_agent_steps,
    )
}
