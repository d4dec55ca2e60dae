//! Gmail 专家的装配：提示词 + 工具绑定

use std::sync::Arc;

use crate::agents::{load_prompt_override, render_profile, SpecialistAgent};
use crate::config::AppConfig;
use crate::llm::LlmClient;
use crate::store::{ContactStore, EmailStore, ResultCache};
use crate::tools::gmail::{
    CreateDraftTool, EmailAction, EmailDispositionTool, LabelTool, ListEmailsTool, ListUnreadTool,
    MarkEmailTool, ReadEmailTool, ReplyEmailTool, SearchEmailsTool, SendEmailTool,
};
use crate::tools::contacts::{
    AddContactTool, ListContactsTool, QueryContactsTool, RemoveContactTool,
};
use crate::tools::{EndConversationTool, ToolExecutor, ToolRegistry};

pub const GMAIL_AGENT_NAME: &str = "gmail";

/// 默认提示词；config/prompts/gmail.txt 存在时以文件为准
const GMAIL_PROMPT: &str = r#"You are {user_name}'s personal Gmail assistant. You respond and take actions as if you ARE {user_name} ({user_email}, timezone {timezone}).

Your capabilities: list, search and read emails; mark read/unread; archive, trash or permanently delete; manage labels; send emails and replies; create drafts; manage the local contact cache.

Email address lookup priority:
1. FIRST use query_contacts (instant lookup from saved contacts).
2. If not cached, ask the user for the address, then offer to save it with add_contact.

When the user references emails by number ("email 1", "the second email"), use the number from the most recent list they have seen - do not re-query.

Before sending, replying or deleting anything, show the user what you are about to do and confirm. Destructive and outward-visible actions require explicit confirmation.

When the user wants to exit, quit, stop, or end the conversation, call the end_conversation tool.

Be conversational and helpful. Ask for clarification if needed."#;

/// 构建 Gmail 专家：域内工具 + 共享联系人工具 + 终止哨兵
pub fn create_gmail_agent(
    llm: Arc<dyn LlmClient>,
    email_store: Arc<dyn EmailStore>,
    contact_store: Arc<dyn ContactStore>,
    cache: ResultCache,
    cfg: &AppConfig,
) -> SpecialistAgent {
    let mut tools = ToolRegistry::new();
    tools.register(ListEmailsTool::new(email_store.clone(), cache.clone()));
    tools.register(ListUnreadTool::new(email_store.clone(), cache.clone()));
    tools.register(SearchEmailsTool::new(email_store.clone(), cache.clone()));
    tools.register(ReadEmailTool::new(email_store.clone(), cache.clone()));
    tools.register(MarkEmailTool::mark_read(email_store.clone(), cache.clone()));
    tools.register(MarkEmailTool::mark_unread(email_store.clone(), cache.clone()));
    tools.register(EmailDispositionTool::new(
        email_store.clone(),
        cache.clone(),
        EmailAction::Archive,
    ));
    tools.register(EmailDispositionTool::new(
        email_store.clone(),
        cache.clone(),
        EmailAction::Trash,
    ));
    tools.register(EmailDispositionTool::new(
        email_store.clone(),
        cache.clone(),
        EmailAction::Delete,
    ));
    tools.register(LabelTool::add(email_store.clone(), cache.clone()));
    tools.register(LabelTool::remove(email_store.clone(), cache.clone()));
    tools.register(SendEmailTool::new(email_store.clone()));
    tools.register(ReplyEmailTool::new(email_store.clone(), cache.clone()));
    tools.register(CreateDraftTool::new(email_store));

    tools.register(QueryContactsTool::new(contact_store.clone()));
    tools.register(AddContactTool::new(contact_store.clone()));
    tools.register(ListContactsTool::new(contact_store.clone()));
    tools.register(RemoveContactTool::new(contact_store));

    tools.register(EndConversationTool);

    let prompt = load_prompt_override(GMAIL_AGENT_NAME)
        .unwrap_or_else(|| GMAIL_PROMPT.to_string());
    SpecialistAgent::new(
        GMAIL_AGENT_NAME,
        llm,
        ToolExecutor::new(tools, cfg.tools.tool_timeout_secs),
        &render_profile(&prompt, &cfg.profile),
        cfg.tools.max_agent_steps,
    )
}
