//! Gmail 域工具集
//!
//! 全部通过 EmailStore 能力面操作；列表/搜索结果写入 ResultCache，
//! 之后的序号引用（email_number）一律从缓存解析而不重新查询。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::AgentError;
use crate::store::{EmailStore, EmailSummary, ResultCache};
use crate::tools::{optional_usize, required_str, required_usize, Tool};

const DEFAULT_MAX_RESULTS: usize = 10;
const BODY_PREVIEW_CHARS: usize = 1500;

/// 序号 -> 缓存邮件；越界转为可喂回模型的提示文本
fn resolve_cached_email(cache: &ResultCache, number: usize) -> Result<EmailSummary, String> {
    match cache.resolve_email(number) {
        Ok(email) => Ok(email),
        Err(AgentError::OrdinalOutOfRange { len: 0, .. }) => Err(
            "No emails in context. Please list or search for emails first.".to_string(),
        ),
        Err(AgentError::OrdinalOutOfRange { len, .. }) => Err(format!(
            "Invalid email number. Please choose between 1 and {}.",
            len
        )),
        Err(e) => Err(e.to_string()),
    }
}

/// 编号列表（用户之后用「第 N 封」引用）
fn format_email_list(emails: &[EmailSummary]) -> String {
    if emails.is_empty() {
        return "No emails found.".to_string();
    }
    let mut lines = vec![format!("Found {} email(s):", emails.len())];
    for (i, e) in emails.iter().enumerate() {
        let marker = if e.unread { " [unread]" } else { "" };
        lines.push(format!(
            "{}. {} - from {} ({}){}",
            i + 1,
            e.subject,
            e.from,
            e.date.format("%Y-%m-%d %H:%M"),
            marker
        ));
    }
    lines.join("\n")
}

/// 列出收件箱邮件
pub struct ListEmailsTool {
    store: Arc<dyn EmailStore>,
    cache: ResultCache,
}

impl ListEmailsTool {
    pub fn new(store: Arc<dyn EmailStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl Tool for ListEmailsTool {
    fn name(&self) -> &str {
        "list_emails"
    }

    fn description(&self) -> &str {
        "List recent inbox emails as a numbered list. Args: {\"max_results\": 10}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let max = optional_usize(&args, "max_results").unwrap_or(DEFAULT_MAX_RESULTS);
        let emails = self.store.list(max).await.map_err(|e| e.to_string())?;
        self.cache.set_emails(emails.clone());
        Ok(format_email_list(&emails))
    }
}

/// 列出未读邮件
pub struct ListUnreadTool {
    store: Arc<dyn EmailStore>,
    cache: ResultCache,
}

impl ListUnreadTool {
    pub fn new(store: Arc<dyn EmailStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl Tool for ListUnreadTool {
    fn name(&self) -> &str {
        "list_unread"
    }

    fn description(&self) -> &str {
        "List unread emails as a numbered list. Args: {\"max_results\": 10}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let max = optional_usize(&args, "max_results").unwrap_or(DEFAULT_MAX_RESULTS);
        let emails = self
            .store
            .search("is:unread", max)
            .await
            .map_err(|e| e.to_string())?;
        self.cache.set_emails(emails.clone());
        Ok(format_email_list(&emails))
    }
}

/// 按 Gmail 查询语法搜索
pub struct SearchEmailsTool {
    store: Arc<dyn EmailStore>,
    cache: ResultCache,
}

impl SearchEmailsTool {
    pub fn new(store: Arc<dyn EmailStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl Tool for SearchEmailsTool {
    fn name(&self) -> &str {
        "search_emails"
    }

    fn description(&self) -> &str {
        "Search emails with Gmail query syntax (is:unread, from:x, keywords). Args: {\"query\": \"...\", \"max_results\": 10}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let query = required_str(&args, "query")?;
        let max = optional_usize(&args, "max_results").unwrap_or(DEFAULT_MAX_RESULTS);
        let emails = self
            .store
            .search(&query, max)
            .await
            .map_err(|e| e.to_string())?;
        self.cache.set_emails(emails.clone());
        Ok(format_email_list(&emails))
    }
}

/// 按序号读取邮件详情
pub struct ReadEmailTool {
    store: Arc<dyn EmailStore>,
    cache: ResultCache,
}

impl ReadEmailTool {
    pub fn new(store: Arc<dyn EmailStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl Tool for ReadEmailTool {
    fn name(&self) -> &str {
        "read_email"
    }

    fn description(&self) -> &str {
        "Read a specific email by its number from the most recent list. Args: {\"email_number\": 1}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let number = required_usize(&args, "email_number")?;
        let summary = resolve_cached_email(&self.cache, number)?;
        let email = self
            .store
            .get(&summary.id)
            .await
            .map_err(|e| e.to_string())?;
        let body: String = email.body.chars().take(BODY_PREVIEW_CHARS).collect();
        Ok(format!(
            "Subject: {}\nFrom: {}\nTo: {}\nDate: {}\n\n{}",
            email.subject,
            email.from,
            email.to,
            email.date.format("%Y-%m-%d %H:%M"),
            body
        ))
    }
}

/// 标记已读/未读（按注册名区分两个工具）
pub struct MarkEmailTool {
    store: Arc<dyn EmailStore>,
    cache: ResultCache,
    mark_read: bool,
}

impl MarkEmailTool {
    pub fn mark_read(store: Arc<dyn EmailStore>, cache: ResultCache) -> Self {
        Self {
            store,
            cache,
            mark_read: true,
        }
    }

    pub fn mark_unread(store: Arc<dyn EmailStore>, cache: ResultCache) -> Self {
        Self {
            store,
            cache,
            mark_read: false,
        }
    }
}

#[async_trait]
impl Tool for MarkEmailTool {
    fn name(&self) -> &str {
        if self.mark_read {
            "mark_read"
        } else {
            "mark_unread"
        }
    }

    fn description(&self) -> &str {
        if self.mark_read {
            "Mark an email as read by its number from the most recent list. Args: {\"email_number\": 1}"
        } else {
            "Mark an email as unread by its number from the most recent list. Args: {\"email_number\": 1}"
        }
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let number = required_usize(&args, "email_number")?;
        let email = resolve_cached_email(&self.cache, number)?;
        self.store
            .set_read(&email.id, self.mark_read)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!(
            "Marked \"{}\" as {}.",
            email.subject,
            if self.mark_read { "read" } else { "unread" }
        ))
    }
}

/// 归档 / 回收站 / 永久删除
#[derive(Clone, Copy)]
pub enum EmailAction {
    Archive,
    Trash,
    Delete,
}

pub struct EmailDispositionTool {
    store: Arc<dyn EmailStore>,
    cache: ResultCache,
    action: EmailAction,
}

impl EmailDispositionTool {
    pub fn new(store: Arc<dyn EmailStore>, cache: ResultCache, action: EmailAction) -> Self {
        Self {
            store,
            cache,
            action,
        }
    }
}

#[async_trait]
impl Tool for EmailDispositionTool {
    fn name(&self) -> &str {
        match self.action {
            EmailAction::Archive => "archive_email",
            EmailAction::Trash => "trash_email",
            EmailAction::Delete => "delete_email",
        }
    }

    fn description(&self) -> &str {
        match self.action {
            EmailAction::Archive => {
                "Archive an email (remove from inbox, keep it) by its number. Args: {\"email_number\": 1}"
            }
            EmailAction::Trash => {
                "Move an email to trash (recoverable) by its number. Args: {\"email_number\": 1}"
            }
            EmailAction::Delete => {
                "Permanently delete an email by its number. NOT recoverable - confirm with the user first. Args: {\"email_number\": 1}"
            }
        }
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let number = required_usize(&args, "email_number")?;
        let email = resolve_cached_email(&self.cache, number)?;
        let verb = match self.action {
            EmailAction::Archive => {
                self.store.archive(&email.id).await.map_err(|e| e.to_string())?;
                "Archived"
            }
            EmailAction::Trash => {
                self.store.trash(&email.id).await.map_err(|e| e.to_string())?;
                "Moved to trash"
            }
            EmailAction::Delete => {
                self.store.delete(&email.id).await.map_err(|e| e.to_string())?;
                "Permanently deleted"
            }
        };
        Ok(format!("{}: \"{}\".", verb, email.subject))
    }
}

/// 给邮件加 / 移除标签
pub struct LabelTool {
    store: Arc<dyn EmailStore>,
    cache: ResultCache,
    add: bool,
}

impl LabelTool {
    pub fn add(store: Arc<dyn EmailStore>, cache: ResultCache) -> Self {
        Self {
            store,
            cache,
            add: true,
        }
    }

    pub fn remove(store: Arc<dyn EmailStore>, cache: ResultCache) -> Self {
        Self {
            store,
            cache,
            add: false,
        }
    }
}

#[async_trait]
impl Tool for LabelTool {
    fn name(&self) -> &str {
        if self.add {
            "add_label"
        } else {
            "remove_label"
        }
    }

    fn description(&self) -> &str {
        if self.add {
            "Add a label to an email by its number. Args: {\"email_number\": 1, \"label\": \"work\"}"
        } else {
            "Remove a label from an email by its number. Args: {\"email_number\": 1, \"label\": \"work\"}"
        }
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let number = required_usize(&args, "email_number")?;
        let label = required_str(&args, "label")?;
        let email = resolve_cached_email(&self.cache, number)?;
        let (add, remove): (Vec<String>, Vec<String>) = if self.add {
            (vec![label.clone()], Vec::new())
        } else {
            (Vec::new(), vec![label.clone()])
        };
        self.store
            .modify_labels(&email.id, &add, &remove)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!(
            "{} label \"{}\" {} \"{}\".",
            if self.add { "Added" } else { "Removed" },
            label,
            if self.add { "to" } else { "from" },
            email.subject
        ))
    }
}

/// 发送新邮件（外部可见动作，提示词要求先向用户确认）
pub struct SendEmailTool {
    store: Arc<dyn EmailStore>,
}

impl SendEmailTool {
    pub fn new(store: Arc<dyn EmailStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send a new email immediately. Args: {\"to\": \"a@b.com\", \"subject\": \"...\", \"body\": \"...\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let to = required_str(&args, "to")?;
        let subject = required_str(&args, "subject")?;
        let body = required_str(&args, "body")?;
        let id = self
            .store
            .send(&to, &subject, &body)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("Email sent to {} (id {}).", to, id))
    }
}

/// 按序号回复邮件
pub struct ReplyEmailTool {
    store: Arc<dyn EmailStore>,
    cache: ResultCache,
}

impl ReplyEmailTool {
    pub fn new(store: Arc<dyn EmailStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl Tool for ReplyEmailTool {
    fn name(&self) -> &str {
        "reply_to_email"
    }

    fn description(&self) -> &str {
        "Reply to an email by its number from the most recent list (sends immediately). Args: {\"email_number\": 1, \"body\": \"...\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let number = required_usize(&args, "email_number")?;
        let body = required_str(&args, "body")?;
        let email = resolve_cached_email(&self.cache, number)?;
        self.store
            .reply(&email.id, &body)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("Reply sent to {} (\"{}\").", email.from, email.subject))
    }
}

/// 创建草稿（不发送）
pub struct CreateDraftTool {
    store: Arc<dyn EmailStore>,
}

impl CreateDraftTool {
    pub fn new(store: Arc<dyn EmailStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateDraftTool {
    fn name(&self) -> &str {
        "create_draft"
    }

    fn description(&self) -> &str {
        "Create a draft email for later review (does NOT send). Args: {\"to\": \"a@b.com\", \"subject\": \"...\", \"body\": \"...\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let to = required_str(&args, "to")?;
        let subject = required_str(&args, "subject")?;
        let body = required_str(&args, "body")?;
        let id = self
            .store
            .create_draft(&to, &subject, &body)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("Draft created for {} (id {}).", to, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryEmailStore;

    fn setup() -> (Arc<InMemoryEmailStore>, ResultCache) {
        (
            Arc::new(InMemoryEmailStore::with_sample_data()),
            ResultCache::new(),
        )
    }

    #[tokio::test]
    async fn list_populates_cache_for_ordinals() {
        let (store, cache) = setup();
        let tool = ListEmailsTool::new(store.clone(), cache.clone());
        let out = tool.execute(serde_json::json!({})).await.unwrap();
        assert!(out.starts_with("Found 3 email(s):"));
        assert_eq!(cache.emails().len(), 3);
        assert_eq!(cache.resolve_email(2).unwrap().id, "msg-2");
    }

    #[tokio::test]
    async fn read_without_prior_list_reports_empty_context() {
        let (store, cache) = setup();
        let tool = ReadEmailTool::new(store, cache);
        let err = tool
            .execute(serde_json::json!({"email_number": 1}))
            .await
            .unwrap_err();
        assert!(err.contains("No emails in context"));
    }

    #[tokio::test]
    async fn read_out_of_range_reports_bounds() {
        let (store, cache) = setup();
        ListEmailsTool::new(store.clone(), cache.clone())
            .execute(serde_json::json!({}))
            .await
            .unwrap();
        let err = ReadEmailTool::new(store, cache)
            .execute(serde_json::json!({"email_number": 9}))
            .await
            .unwrap_err();
        assert!(err.contains("between 1 and 3"));
    }

    #[tokio::test]
    async fn delete_resolves_ordinal_before_store_call() {
        let (store, cache) = setup();
        ListEmailsTool::new(store.clone(), cache.clone())
            .execute(serde_json::json!({}))
            .await
            .unwrap();
        let tool = EmailDispositionTool::new(store.clone(), cache, EmailAction::Delete);
        let out = tool
            .execute(serde_json::json!({"email_number": 2}))
            .await
            .unwrap();
        assert!(out.contains("Permanently deleted"));
        assert!(store.get("msg-2").await.is_err());
    }

    #[tokio::test]
    async fn reply_uses_cached_sender() {
        let (store, cache) = setup();
        ListUnreadTool::new(store.clone(), cache.clone())
            .execute(serde_json::json!({}))
            .await
            .unwrap();
        let out = ReplyEmailTool::new(store.clone(), cache)
            .execute(serde_json::json!({"email_number": 2, "body": "see you"}))
            .await
            .unwrap();
        assert!(out.contains("Reply sent"));
        assert_eq!(store.outbox().len(), 1);
    }

    #[tokio::test]
    async fn send_requires_all_fields() {
        let (store, _) = setup();
        let err = SendEmailTool::new(store)
            .execute(serde_json::json!({"to": "a@b.c"}))
            .await
            .unwrap_err();
        assert!(err.contains("subject"));
    }
}
