//! InMemory 能力面实现
//!
//! 离线运行与测试用的假后端：行为与接口语义一致（含 NotFound、归档/回收站标签等），
//! 数据只存进程内。

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::store::traits::{CalendarStore, EmailStore};
use crate::store::types::{
    EmailDetail, EmailSummary, EventDetail, EventSummary, NewEvent, RemoteApiError, RsvpStatus,
};

const LABEL_INBOX: &str = "INBOX";
const LABEL_TRASH: &str = "TRASH";

/// 进程内邮件后端
pub struct InMemoryEmailStore {
    emails: RwLock<Vec<EmailDetail>>,
    /// 已发送（send / reply 产生），仅用于观察副作用
    outbox: RwLock<Vec<EmailDetail>>,
    drafts: RwLock<Vec<EmailDetail>>,
    seq: RwLock<u64>,
}

impl InMemoryEmailStore {
    pub fn new() -> Self {
        Self {
            emails: RwLock::new(Vec::new()),
            outbox: RwLock::new(Vec::new()),
            drafts: RwLock::new(Vec::new()),
            seq: RwLock::new(0),
        }
    }

    /// 预置少量示例邮件（离线演示用）
    pub fn with_sample_data() -> Self {
        let store = Self::new();
        let now = Utc::now();
        let samples = [
            ("alice@example.com", "Quarterly report", "Hi, the quarterly report is attached. Please review before Friday.", true),
            ("bob@example.com", "Lunch tomorrow?", "Want to grab lunch tomorrow around noon?", true),
            ("newsletter@rustweek.ly", "This week in Rust", "Highlights from the Rust ecosystem this week.", false),
        ];
        for (i, (from, subject, body, unread)) in samples.iter().enumerate() {
            store.emails.write().unwrap().push(EmailDetail {
                id: format!("msg-{}", i + 1),
                from: from.to_string(),
                to: "me@example.com".to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
                date: now - Duration::hours(i as i64 + 1),
                unread: *unread,
                labels: vec![LABEL_INBOX.to_string()],
            });
        }
        *store.seq.write().unwrap() = samples.len() as u64;
        store
    }

    pub fn outbox(&self) -> Vec<EmailDetail> {
        self.outbox.read().unwrap().clone()
    }

    pub fn drafts(&self) -> Vec<EmailDetail> {
        self.drafts.read().unwrap().clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut seq = self.seq.write().unwrap();
        *seq += 1;
        format!("{}-{}", prefix, seq)
    }

    fn find(&self, id: &str) -> Result<EmailDetail, RemoteApiError> {
        self.emails
            .read()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(RemoteApiError::NotFound {
                kind: "email",
                id: id.to_string(),
            })
    }

    fn update<F>(&self, id: &str, f: F) -> Result<(), RemoteApiError>
    where
        F: FnOnce(&mut EmailDetail),
    {
        let mut emails = self.emails.write().unwrap();
        let email = emails
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(RemoteApiError::NotFound {
                kind: "email",
                id: id.to_string(),
            })?;
        f(email);
        Ok(())
    }
}

impl Default for InMemoryEmailStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailStore for InMemoryEmailStore {
    async fn list(&self, max_results: usize) -> Result<Vec<EmailSummary>, RemoteApiError> {
        Ok(self
            .emails
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.labels.iter().any(|l| l == LABEL_INBOX))
            .take(max_results)
            .map(|e| e.summary())
            .collect())
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EmailSummary>, RemoteApiError> {
        // 极简的 Gmail 查询子集：is:unread / from:xxx / 关键词子串
        let mut unread_only = false;
        let mut from_filter: Option<String> = None;
        let mut keywords: Vec<String> = Vec::new();
        for token in query.split_whitespace() {
            if token.eq_ignore_ascii_case("is:unread") {
                unread_only = true;
            } else if let Some(f) = token.strip_prefix("from:") {
                from_filter = Some(f.to_lowercase());
            } else {
                keywords.push(token.to_lowercase());
            }
        }

        Ok(self
            .emails
            .read()
            .unwrap()
            .iter()
            .filter(|e| !unread_only || e.unread)
            .filter(|e| {
                from_filter
                    .as_ref()
                    .map(|f| e.from.to_lowercase().contains(f))
                    .unwrap_or(true)
            })
            .filter(|e| {
                keywords.iter().all(|k| {
                    e.subject.to_lowercase().contains(k)
                        || e.body.to_lowercase().contains(k)
                        || e.from.to_lowercase().contains(k)
                })
            })
            .take(max_results)
            .map(|e| e.summary())
            .collect())
    }

    async fn get(&self, id: &str) -> Result<EmailDetail, RemoteApiError> {
        self.find(id)
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, RemoteApiError> {
        if to.trim().is_empty() {
            return Err(RemoteApiError::InvalidRequest(
                "recipient must not be empty".to_string(),
            ));
        }
        let id = self.next_id("sent");
        self.outbox.write().unwrap().push(EmailDetail {
            id: id.clone(),
            from: "me@example.com".to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            date: Utc::now(),
            unread: false,
            labels: vec!["SENT".to_string()],
        });
        Ok(id)
    }

    async fn reply(&self, id: &str, body: &str) -> Result<String, RemoteApiError> {
        let original = self.find(id)?;
        self.send(
            &original.from,
            &format!("Re: {}", original.subject),
            body,
        )
        .await
    }

    async fn create_draft(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, RemoteApiError> {
        let id = self.next_id("draft");
        self.drafts.write().unwrap().push(EmailDetail {
            id: id.clone(),
            from: "me@example.com".to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            date: Utc::now(),
            unread: false,
            labels: vec!["DRAFT".to_string()],
        });
        Ok(id)
    }

    async fn modify_labels(
        &self,
        id: &str,
        add: &[String],
        remove: &[String],
    ) -> Result<(), RemoteApiError> {
        self.update(id, |e| {
            for label in add {
                if !e.labels.contains(label) {
                    e.labels.push(label.clone());
                }
            }
            e.labels.retain(|l| !remove.contains(l));
        })
    }

    async fn set_read(&self, id: &str, read: bool) -> Result<(), RemoteApiError> {
        self.update(id, |e| e.unread = !read)
    }

    async fn archive(&self, id: &str) -> Result<(), RemoteApiError> {
        self.update(id, |e| e.labels.retain(|l| l != LABEL_INBOX))
    }

    async fn trash(&self, id: &str) -> Result<(), RemoteApiError> {
        self.update(id, |e| {
            e.labels.retain(|l| l != LABEL_INBOX);
            if !e.labels.iter().any(|l| l == LABEL_TRASH) {
                e.labels.push(LABEL_TRASH.to_string());
            }
        })
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteApiError> {
        let mut emails = self.emails.write().unwrap();
        let before = emails.len();
        emails.retain(|e| e.id != id);
        if emails.len() == before {
            return Err(RemoteApiError::NotFound {
                kind: "email",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

/// 进程内日历后端
pub struct InMemoryCalendarStore {
    events: RwLock<Vec<EventDetail>>,
    seq: RwLock<u64>,
}

impl InMemoryCalendarStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            seq: RwLock::new(0),
        }
    }

    /// 预置未来一周内的示例事件（离线演示用）
    pub fn with_sample_data() -> Self {
        let store = Self::new();
        let now = Utc::now();
        let samples = [
            ("Team standup", 1, vec!["alice@example.com".to_string()]),
            ("Design review", 2, vec!["bob@example.com".to_string(), "carol@example.com".to_string()]),
            ("1:1 with manager", 3, Vec::new()),
        ];
        for (i, (title, days, attendees)) in samples.into_iter().enumerate() {
            let start = now + Duration::days(days);
            store.events.write().unwrap().push(EventDetail {
                id: format!("evt-{}", i + 1),
                title: title.to_string(),
                description: None,
                location: None,
                start,
                end: start + Duration::hours(1),
                attendees,
                rsvp: RsvpStatus::NeedsAction,
                reminder_minutes: vec![10],
            });
        }
        *store.seq.write().unwrap() = 3;
        store
    }

    fn next_id(&self) -> String {
        let mut seq = self.seq.write().unwrap();
        *seq += 1;
        format!("evt-{}", seq)
    }

    fn update<F>(&self, id: &str, f: F) -> Result<EventDetail, RemoteApiError>
    where
        F: FnOnce(&mut EventDetail),
    {
        let mut events = self.events.write().unwrap();
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(RemoteApiError::NotFound {
                kind: "event",
                id: id.to_string(),
            })?;
        f(event);
        Ok(event.clone())
    }
}

impl Default for InMemoryCalendarStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalendarStore for InMemoryCalendarStore {
    async fn list_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        max_results: usize,
    ) -> Result<Vec<EventSummary>, RemoteApiError> {
        let mut hits: Vec<EventDetail> = self
            .events
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.start >= from && e.start <= to)
            .cloned()
            .collect();
        hits.sort_by_key(|e| e.start);
        Ok(hits.into_iter().take(max_results).map(|e| e.summary()).collect())
    }

    async fn get_event(&self, id: &str) -> Result<EventDetail, RemoteApiError> {
        self.events
            .read()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(RemoteApiError::NotFound {
                kind: "event",
                id: id.to_string(),
            })
    }

    async fn create_event(&self, event: NewEvent) -> Result<EventDetail, RemoteApiError> {
        if event.end <= event.start {
            return Err(RemoteApiError::InvalidRequest(
                "event end must be after start".to_string(),
            ));
        }
        let detail = EventDetail {
            id: self.next_id(),
            title: event.title,
            description: event.description,
            location: event.location,
            start: event.start,
            end: event.end,
            attendees: event.attendees,
            rsvp: RsvpStatus::Accepted,
            reminder_minutes: vec![10],
        };
        self.events.write().unwrap().push(detail.clone());
        Ok(detail)
    }

    async fn update_time(
        &self,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<EventDetail, RemoteApiError> {
        if end <= start {
            return Err(RemoteApiError::InvalidRequest(
                "event end must be after start".to_string(),
            ));
        }
        self.update(id, |e| {
            e.start = start;
            e.end = end;
        })
    }

    async fn add_attendees(
        &self,
        id: &str,
        emails: &[String],
    ) -> Result<EventDetail, RemoteApiError> {
        self.update(id, |e| {
            for email in emails {
                if !e.attendees.contains(email) {
                    e.attendees.push(email.clone());
                }
            }
        })
    }

    async fn remove_attendees(
        &self,
        id: &str,
        emails: &[String],
    ) -> Result<EventDetail, RemoteApiError> {
        self.update(id, |e| e.attendees.retain(|a| !emails.contains(a)))
    }

    async fn delete_event(&self, id: &str) -> Result<(), RemoteApiError> {
        let mut events = self.events.write().unwrap();
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(RemoteApiError::NotFound {
                kind: "event",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn set_rsvp(&self, id: &str, status: RsvpStatus) -> Result<EventDetail, RemoteApiError> {
        self.update(id, |e| e.rsvp = status)
    }

    async fn set_reminders(
        &self,
        id: &str,
        minutes: &[i64],
    ) -> Result<EventDetail, RemoteApiError> {
        self.update(id, |e| e.reminder_minutes = minutes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_supports_unread_and_keywords() {
        let store = InMemoryEmailStore::with_sample_data();
        let unread = store.search("is:unread", 10).await.unwrap();
        assert_eq!(unread.len(), 2);

        let hits = store.search("lunch", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].subject.contains("Lunch"));
    }

    #[tokio::test]
    async fn archive_removes_from_inbox_listing() {
        let store = InMemoryEmailStore::with_sample_data();
        store.archive("msg-1").await.unwrap();
        let inbox = store.list(10).await.unwrap();
        assert!(inbox.iter().all(|e| e.id != "msg-1"));
        // 归档不等于删除
        assert!(store.get("msg-1").await.is_ok());
    }

    #[tokio::test]
    async fn delete_unknown_email_is_not_found() {
        let store = InMemoryEmailStore::new();
        let err = store.delete("nope").await.unwrap_err();
        assert!(matches!(err, RemoteApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn reply_lands_in_outbox_with_re_subject() {
        let store = InMemoryEmailStore::with_sample_data();
        store.reply("msg-2", "Sounds good!").await.unwrap();
        let outbox = store.outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "bob@example.com");
        assert!(outbox[0].subject.starts_with("Re: "));
    }

    #[tokio::test]
    async fn create_event_rejects_inverted_range() {
        let store = InMemoryCalendarStore::new();
        let now = Utc::now();
        let err = store
            .create_event(NewEvent {
                title: "bad".into(),
                description: None,
                location: None,
                start: now,
                end: now - Duration::hours(1),
                attendees: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn list_events_is_sorted_and_windowed() {
        let store = InMemoryCalendarStore::with_sample_data();
        let now = Utc::now();
        let events = store
            .list_events(now, now + Duration::days(2), 10)
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].start <= events[1].start);
    }
}
