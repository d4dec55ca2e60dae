//! Calendar 域工具集
//!
//! 通过 CalendarStore 能力面操作；列表结果写入 ResultCache，
//! 之后的序号引用（event_number）从缓存解析出事件 ID 再调用能力面。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde_json::Value;

use crate::core::AgentError;
use crate::store::{CalendarStore, EventDetail, EventSummary, NewEvent, ResultCache, RsvpStatus};
use crate::tools::{optional_str, optional_usize, required_str, required_usize, string_array, Tool};

const DEFAULT_MAX_RESULTS: usize = 10;
const DEFAULT_LOOKAHEAD_DAYS: i64 = 7;

/// 解析模型给出的时间：RFC3339 优先，其次 "YYYY-MM-DD HH:MM"（按 UTC）
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!(
        "Could not parse datetime \"{}\". Use RFC3339 (2026-01-15T14:00:00Z) or \"YYYY-MM-DD HH:MM\" in UTC.",
        s
    ))
}

fn resolve_cached_event(cache: &ResultCache, number: usize) -> Result<EventSummary, String> {
    match cache.resolve_event(number) {
        Ok(event) => Ok(event),
        Err(AgentError::OrdinalOutOfRange { len: 0, .. }) => {
            Err("No events in context. Please list events first.".to_string())
        }
        Err(AgentError::OrdinalOutOfRange { len, .. }) => Err(format!(
            "Invalid event number. Please choose between 1 and {}.",
            len
        )),
        Err(e) => Err(e.to_string()),
    }
}

fn format_event_list(events: &[EventSummary]) -> String {
    if events.is_empty() {
        return "No events found in that period.".to_string();
    }
    let mut lines = vec![format!("Found {} event(s):", events.len())];
    for (i, e) in events.iter().enumerate() {
        lines.push(format!(
            "{}. {} ({} - {})",
            i + 1,
            e.title,
            e.start.format("%Y-%m-%d %H:%M"),
            e.end.format("%H:%M")
        ));
    }
    lines.join("\n")
}

fn format_event_detail(event: &EventDetail) -> String {
    let mut lines = vec![
        format!("Title: {}", event.title),
        format!(
            "When: {} - {}",
            event.start.format("%Y-%m-%d %H:%M"),
            event.end.format("%Y-%m-%d %H:%M")
        ),
    ];
    if let Some(ref location) = event.location {
        lines.push(format!("Where: {}", location));
    }
    if let Some(ref description) = event.description {
        lines.push(format!("Description: {}", description));
    }
    if !event.attendees.is_empty() {
        lines.push(format!("Attendees: {}", event.attendees.join(", ")));
    }
    lines.push(format!("RSVP: {}", event.rsvp.as_str()));
    if !event.reminder_minutes.is_empty() {
        let mins: Vec<String> = event.reminder_minutes.iter().map(|m| m.to_string()).collect();
        lines.push(format!("Reminders: {} minutes before", mins.join(", ")));
    }
    lines.join("\n")
}

/// 当前时间（模型计算「明天」「下周」等相对日期的锚点）
pub struct GetCurrentTimeTool;

#[async_trait]
impl Tool for GetCurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time in UTC. Always call this before computing relative dates like \"tomorrow\". Args: {}"
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        let now = Utc::now();
        Ok(format!(
            "Current UTC time: {} ({})",
            now.format("%Y-%m-%d %H:%M:%S"),
            now.format("%A")
        ))
    }
}

/// 列出接下来 N 天的事件
pub struct ListEventsTool {
    store: Arc<dyn CalendarStore>,
    cache: ResultCache,
}

impl ListEventsTool {
    pub fn new(store: Arc<dyn CalendarStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl Tool for ListEventsTool {
    fn name(&self) -> &str {
        "list_events"
    }

    fn description(&self) -> &str {
        "List upcoming events as a numbered list. Args: {\"days\": 7, \"max_results\": 10}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let days = optional_usize(&args, "days").unwrap_or(DEFAULT_LOOKAHEAD_DAYS as usize) as i64;
        let max = optional_usize(&args, "max_results").unwrap_or(DEFAULT_MAX_RESULTS);
        let now = Utc::now();
        let events = self
            .store
            .list_events(now, now + Duration::days(days), max)
            .await
            .map_err(|e| e.to_string())?;
        self.cache.set_events(events.clone());
        Ok(format_event_list(&events))
    }
}

/// 按序号查看事件详情
pub struct GetEventTool {
    store: Arc<dyn CalendarStore>,
    cache: ResultCache,
}

impl GetEventTool {
    pub fn new(store: Arc<dyn CalendarStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl Tool for GetEventTool {
    fn name(&self) -> &str {
        "get_event"
    }

    fn description(&self) -> &str {
        "Show details of an event by its number from the most recent list. Args: {\"event_number\": 1}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let number = required_usize(&args, "event_number")?;
        let summary = resolve_cached_event(&self.cache, number)?;
        let event = self
            .store
            .get_event(&summary.id)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format_event_detail(&event))
    }
}

/// 新建事件
pub struct CreateEventTool {
    store: Arc<dyn CalendarStore>,
}

impl CreateEventTool {
    pub fn new(store: Arc<dyn CalendarStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateEventTool {
    fn name(&self) -> &str {
        "create_event"
    }

    fn description(&self) -> &str {
        "Schedule a new event. Args: {\"title\": \"...\", \"start\": \"2026-01-15T14:00:00Z\", \"end\": \"2026-01-15T15:00:00Z\", \"attendees\": [\"a@b.com\"], \"description\": \"...\", \"location\": \"...\"} (attendees/description/location optional)"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let title = required_str(&args, "title")?;
        let start = parse_datetime(&required_str(&args, "start")?)?;
        let end = parse_datetime(&required_str(&args, "end")?)?;
        let event = self
            .store
            .create_event(NewEvent {
                title,
                description: optional_str(&args, "description"),
                location: optional_str(&args, "location"),
                start,
                end,
                attendees: string_array(&args, "attendees"),
            })
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!(
            "Event created (id {}).\n{}",
            event.id,
            format_event_detail(&event)
        ))
    }
}

/// 改期（按序号）
pub struct UpdateEventTimeTool {
    store: Arc<dyn CalendarStore>,
    cache: ResultCache,
}

impl UpdateEventTimeTool {
    pub fn new(store: Arc<dyn CalendarStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl Tool for UpdateEventTimeTool {
    fn name(&self) -> &str {
        "update_event_time"
    }

    fn description(&self) -> &str {
        "Reschedule an event by its number. Args: {\"event_number\": 1, \"start\": \"...\", \"end\": \"...\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let number = required_usize(&args, "event_number")?;
        let start = parse_datetime(&required_str(&args, "start")?)?;
        let end = parse_datetime(&required_str(&args, "end")?)?;
        let summary = resolve_cached_event(&self.cache, number)?;
        let event = self
            .store
            .update_time(&summary.id, start, end)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("Event rescheduled.\n{}", format_event_detail(&event)))
    }
}

/// 添加 / 移除参与人
pub struct AttendeesTool {
    store: Arc<dyn CalendarStore>,
    cache: ResultCache,
    add: bool,
}

impl AttendeesTool {
    pub fn add(store: Arc<dyn CalendarStore>, cache: ResultCache) -> Self {
        Self {
            store,
            cache,
            add: true,
        }
    }

    pub fn remove(store: Arc<dyn CalendarStore>, cache: ResultCache) -> Self {
        Self {
            store,
            cache,
            add: false,
        }
    }
}

#[async_trait]
impl Tool for AttendeesTool {
    fn name(&self) -> &str {
        if self.add {
            "add_attendees"
        } else {
            "remove_attendees"
        }
    }

    fn description(&self) -> &str {
        if self.add {
            "Add attendees to an event by its number. Outward-visible - confirm with the user first. Args: {\"event_number\": 1, \"attendees\": [\"a@b.com\"]}"
        } else {
            "Remove attendees from an event by its number. Outward-visible - confirm with the user first. Args: {\"event_number\": 1, \"attendees\": [\"a@b.com\"]}"
        }
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let number = required_usize(&args, "event_number")?;
        let attendees = string_array(&args, "attendees");
        if attendees.is_empty() {
            return Err("Missing required argument 'attendees'".to_string());
        }
        let summary = resolve_cached_event(&self.cache, number)?;
        let event = if self.add {
            self.store.add_attendees(&summary.id, &attendees).await
        } else {
            self.store.remove_attendees(&summary.id, &attendees).await
        }
        .map_err(|e| e.to_string())?;
        Ok(format!(
            "{} {} attendee(s).\n{}",
            if self.add { "Added" } else { "Removed" },
            attendees.len(),
            format_event_detail(&event)
        ))
    }
}

/// 删除事件（按序号）
pub struct DeleteEventTool {
    store: Arc<dyn CalendarStore>,
    cache: ResultCache,
}

impl DeleteEventTool {
    pub fn new(store: Arc<dyn CalendarStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl Tool for DeleteEventTool {
    fn name(&self) -> &str {
        "delete_event"
    }

    fn description(&self) -> &str {
        "Delete an event by its number from the most recent list. NOT recoverable - confirm with the user first. Args: {\"event_number\": 1}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let number = required_usize(&args, "event_number")?;
        let summary = resolve_cached_event(&self.cache, number)?;
        self.store
            .delete_event(&summary.id)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("Deleted event \"{}\".", summary.title))
    }
}

/// RSVP 状态
pub struct SetRsvpTool {
    store: Arc<dyn CalendarStore>,
    cache: ResultCache,
}

impl SetRsvpTool {
    pub fn new(store: Arc<dyn CalendarStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl Tool for SetRsvpTool {
    fn name(&self) -> &str {
        "set_rsvp"
    }

    fn description(&self) -> &str {
        "Set RSVP status for an event by its number. Args: {\"event_number\": 1, \"status\": \"accepted|declined|tentative\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let number = required_usize(&args, "event_number")?;
        let status_raw = required_str(&args, "status")?;
        let status = RsvpStatus::parse(&status_raw)
            .ok_or_else(|| format!("Unknown RSVP status \"{}\". Use accepted, declined or tentative.", status_raw))?;
        let summary = resolve_cached_event(&self.cache, number)?;
        let event = self
            .store
            .set_rsvp(&summary.id, status)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!(
            "RSVP for \"{}\" set to {}.",
            event.title,
            status.as_str()
        ))
    }
}

/// 提醒配置
pub struct SetRemindersTool {
    store: Arc<dyn CalendarStore>,
    cache: ResultCache,
}

impl SetRemindersTool {
    pub fn new(store: Arc<dyn CalendarStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl Tool for SetRemindersTool {
    fn name(&self) -> &str {
        "set_reminders"
    }

    fn description(&self) -> &str {
        "Configure reminder notifications for an event by its number. Args: {\"event_number\": 1, \"minutes\": [10, 30]}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let number = required_usize(&args, "event_number")?;
        let minutes: Vec<i64> = args
            .get("minutes")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default();
        if minutes.is_empty() {
            return Err("Missing required argument 'minutes' (array of numbers)".to_string());
        }
        let summary = resolve_cached_event(&self.cache, number)?;
        let event = self
            .store
            .set_reminders(&summary.id, &minutes)
            .await
            .map_err(|e| e.to_string())?;
        let mins: Vec<String> = event.reminder_minutes.iter().map(|m| m.to_string()).collect();
        Ok(format!(
            "Reminders for \"{}\" set to {} minutes before.",
            event.title,
            mins.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCalendarStore;

    fn setup() -> (Arc<InMemoryCalendarStore>, ResultCache) {
        (
            Arc::new(InMemoryCalendarStore::with_sample_data()),
            ResultCache::new(),
        )
    }

    #[test]
    fn parse_datetime_accepts_both_formats() {
        assert!(parse_datetime("2026-01-15T14:00:00Z").is_ok());
        assert!(parse_datetime("2026-01-15 14:00").is_ok());
        assert!(parse_datetime("next tuesday").is_err());
    }

    #[tokio::test]
    async fn list_then_delete_second_event_by_ordinal() {
        let (store, cache) = setup();
        ListEventsTool::new(store.clone(), cache.clone())
            .execute(serde_json::json!({"days": 30}))
            .await
            .unwrap();
        assert_eq!(cache.events().len(), 3);

        // 「删除第 2 个事件」：序号 2 -> 缓存下标 1 -> 其 ID 才进入能力面
        let second_id = cache.resolve_event(2).unwrap().id;
        let out = DeleteEventTool::new(store.clone(), cache)
            .execute(serde_json::json!({"event_number": 2}))
            .await
            .unwrap();
        assert!(out.starts_with("Deleted event"));
        assert!(store.get_event(&second_id).await.is_err());
    }

    #[tokio::test]
    async fn ordinal_out_of_range_is_reported_not_fatal() {
        let (store, cache) = setup();
        ListEventsTool::new(store.clone(), cache.clone())
            .execute(serde_json::json!({"days": 30}))
            .await
            .unwrap();
        let err = DeleteEventTool::new(store, cache)
            .execute(serde_json::json!({"event_number": 7}))
            .await
            .unwrap_err();
        assert!(err.contains("between 1 and 3"));
    }

    #[tokio::test]
    async fn create_event_parses_times_and_attendees() {
        let (store, _) = setup();
        let out = CreateEventTool::new(store)
            .execute(serde_json::json!({
                "title": "Planning",
                "start": "2026-03-01T10:00:00Z",
                "end": "2026-03-01T11:00:00Z",
                "attendees": ["dave@example.com"]
            }))
            .await
            .unwrap();
        assert!(out.contains("Event created"));
        assert!(out.contains("dave@example.com"));
    }

    #[tokio::test]
    async fn rsvp_rejects_unknown_status() {
        let (store, cache) = setup();
        ListEventsTool::new(store.clone(), cache.clone())
            .execute(serde_json::json!({"days": 30}))
            .await
            .unwrap();
        let err = SetRsvpTool::new(store, cache)
            .execute(serde_json::json!({"event_number": 1, "status": "dunno"}))
            .await
            .unwrap_err();
        assert!(err.contains("Unknown RSVP status"));
    }
}
