//! 远端能力面接口：EmailStore / CalendarStore
//!
//! 真实的 Google REST 客户端不在本仓库范围内；这里只定义能力接口，
//! 默认与测试用 InMemory 实现见 store::memory。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::store::types::{
    EmailDetail, EmailSummary, EventDetail, EventSummary, NewEvent, RemoteApiError, RsvpStatus,
};

/// 邮件能力面：列表、搜索、读取与各类修改操作
#[async_trait]
pub trait EmailStore: Send + Sync {
    async fn list(&self, max_results: usize) -> Result<Vec<EmailSummary>, RemoteApiError>;

    /// 搜索；query 支持 Gmail 风格的 `is:unread` 与普通关键词
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EmailSummary>, RemoteApiError>;

    async fn get(&self, id: &str) -> Result<EmailDetail, RemoteApiError>;

    /// 发送新邮件，返回消息 ID
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, RemoteApiError>;

    /// 回复指定邮件，返回消息 ID
    async fn reply(&self, id: &str, body: &str) -> Result<String, RemoteApiError>;

    /// 创建草稿，返回草稿 ID
    async fn create_draft(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, RemoteApiError>;

    async fn modify_labels(
        &self,
        id: &str,
        add: &[String],
        remove: &[String],
    ) -> Result<(), RemoteApiError>;

    async fn set_read(&self, id: &str, read: bool) -> Result<(), RemoteApiError>;

    /// 归档：移出收件箱但保留邮件
    async fn archive(&self, id: &str) -> Result<(), RemoteApiError>;

    /// 移入回收站（可恢复）
    async fn trash(&self, id: &str) -> Result<(), RemoteApiError>;

    /// 永久删除（不可恢复）
    async fn delete(&self, id: &str) -> Result<(), RemoteApiError>;
}

/// 日历能力面：事件查询与增删改
#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn list_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        max_results: usize,
    ) -> Result<Vec<EventSummary>, RemoteApiError>;

    async fn get_event(&self, id: &str) -> Result<EventDetail, RemoteApiError>;

    async fn create_event(&self, event: NewEvent) -> Result<EventDetail, RemoteApiError>;

    async fn update_time(
        &self,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<EventDetail, RemoteApiError>;

    async fn add_attendees(
        &self,
        id: &str,
        emails: &[String],
    ) -> Result<EventDetail, RemoteApiError>;

    async fn remove_attendees(
        &self,
        id: &str,
        emails: &[String],
    ) -> Result<EventDetail, RemoteApiError>;

    async fn delete_event(&self, id: &str) -> Result<(), RemoteApiError>;

    async fn set_rsvp(&self, id: &str, status: RsvpStatus) -> Result<EventDetail, RemoteApiError>;

    async fn set_reminders(
        &self,
        id: &str,
        minutes: &[i64],
    ) -> Result<EventDetail, RemoteApiError>;
}
