//! 领域记录类型：邮件、日历事件、联系人，与远端能力面的错误类型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 远端能力面（Gmail / Calendar REST）的错误；在专家边界统一转为用户可见消息
#[derive(Error, Debug, Clone)]
pub enum RemoteApiError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// 邮件摘要（列表 / 搜索返回，序号引用的解析对象）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailSummary {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    pub date: DateTime<Utc>,
    pub unread: bool,
    pub labels: Vec<String>,
}

/// 邮件详情（read_email 返回）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailDetail {
    pub id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub date: DateTime<Utc>,
    pub unread: bool,
    pub labels: Vec<String>,
}

impl EmailDetail {
    /// 投影为摘要（列表展示与序号缓存用）
    pub fn summary(&self) -> EmailSummary {
        const SNIPPET_CHARS: usize = 100;
        EmailSummary {
            id: self.id.clone(),
            from: self.from.clone(),
            subject: self.subject.clone(),
            snippet: self.body.chars().take(SNIPPET_CHARS).collect(),
            date: self.date,
            unread: self.unread,
            labels: self.labels.clone(),
        }
    }
}

/// 日历事件摘要
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// RSVP 状态（与 Google Calendar attendee responseStatus 对应）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Accepted,
    Declined,
    Tentative,
    NeedsAction,
}

impl RsvpStatus {
    /// 宽松解析用户/模型给出的状态词
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "accepted" | "yes" | "going" | "attending" => Some(Self::Accepted),
            "declined" | "no" | "not going" => Some(Self::Declined),
            "tentative" | "maybe" => Some(Self::Tentative),
            "needs_action" | "needsaction" | "pending" => Some(Self::NeedsAction),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Tentative => "tentative",
            Self::NeedsAction => "needs_action",
        }
    }
}

/// 日历事件详情
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventDetail {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendees: Vec<String>,
    pub rsvp: RsvpStatus,
    /// 提前提醒分钟数
    pub reminder_minutes: Vec<i64>,
}

impl EventDetail {
    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            start: self.start,
            end: self.end,
        }
    }
}

/// 新建事件请求
#[derive(Clone, Debug)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendees: Vec<String>,
}

/// 本地联系人记录
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsvp_parse_is_lenient() {
        assert_eq!(RsvpStatus::parse("Going"), Some(RsvpStatus::Accepted));
        assert_eq!(RsvpStatus::parse("maybe"), Some(RsvpStatus::Tentative));
        assert_eq!(RsvpStatus::parse("no"), Some(RsvpStatus::Declined));
        assert_eq!(RsvpStatus::parse("???"), None);
    }

    #[test]
    fn email_summary_truncates_snippet() {
        let detail = EmailDetail {
            id: "m1".into(),
            from: "a@example.com".into(),
            to: "me@example.com".into(),
            subject: "hi".into(),
            body: "x".repeat(500),
            date: Utc::now(),
            unread: true,
            labels: vec!["INBOX".into()],
        };
        assert_eq!(detail.summary().snippet.chars().count(), 100);
    }
}
