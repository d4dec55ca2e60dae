//! 联系人缓存工具（两个专家共用）
//!
//! 「发邮件给 Mangesh」这类请求先查本地缓存拿邮箱，查不到再让用户给地址；
//! 新地址可随手存入缓存供下次秒查。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::store::{new_contact, Contact, ContactStore};
use crate::tools::{optional_str, required_str, Tool};

fn format_contacts(contacts: &[Contact]) -> String {
    contacts
        .iter()
        .map(|c| {
            let notes = c
                .notes
                .as_deref()
                .map(|n| format!(" ({})", n))
                .unwrap_or_default();
            format!("- {}: {}{}", c.name, c.email, notes)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 按名字查邮箱
pub struct QueryContactsTool {
    store: Arc<dyn ContactStore>,
}

impl QueryContactsTool {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for QueryContactsTool {
    fn name(&self) -> &str {
        "query_contacts"
    }

    fn description(&self) -> &str {
        "Look up a person's email address in the local contact cache (fast - use before asking the user). Args: {\"name\": \"Mangesh\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let name = required_str(&args, "name")?;
        let hits = self.store.find(&name).map_err(|e| e.to_string())?;
        if hits.is_empty() {
            Ok(format!(
                "No contact found for \"{}\". Ask the user for the address, then save it with add_contact.",
                name
            ))
        } else {
            Ok(format!(
                "Found {} contact(s) for \"{}\":\n{}",
                hits.len(),
                name,
                format_contacts(&hits)
            ))
        }
    }
}

/// 新增 / 更新联系人
pub struct AddContactTool {
    store: Arc<dyn ContactStore>,
}

impl AddContactTool {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for AddContactTool {
    fn name(&self) -> &str {
        "add_contact"
    }

    fn description(&self) -> &str {
        "Save or update a contact in the local cache for future lookups. Args: {\"name\": \"...\", \"email\": \"...\", \"notes\": \"...\"} (notes optional)"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let name = required_str(&args, "name")?;
        let email = required_str(&args, "email")?;
        let notes = optional_str(&args, "notes");
        self.store
            .upsert(&new_contact(&name, &email, notes))
            .map_err(|e| e.to_string())?;
        Ok(format!("Saved contact {} <{}>.", name, email))
    }
}

/// 列出全部联系人
pub struct ListContactsTool {
    store: Arc<dyn ContactStore>,
}

impl ListContactsTool {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListContactsTool {
    fn name(&self) -> &str {
        "list_contacts"
    }

    fn description(&self) -> &str {
        "List all saved contacts. Args: {}"
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        let contacts = self.store.all().map_err(|e| e.to_string())?;
        if contacts.is_empty() {
            Ok("Contact cache is empty.".to_string())
        } else {
            Ok(format!(
                "{} saved contact(s):\n{}",
                contacts.len(),
                format_contacts(&contacts)
            ))
        }
    }
}

/// 删除联系人
pub struct RemoveContactTool {
    store: Arc<dyn ContactStore>,
}

impl RemoveContactTool {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RemoveContactTool {
    fn name(&self) -> &str {
        "remove_contact"
    }

    fn description(&self) -> &str {
        "Remove a contact from the local cache by exact name. Args: {\"name\": \"...\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let name = required_str(&args, "name")?;
        if self.store.remove(&name).map_err(|e| e.to_string())? {
            Ok(format!("Removed contact \"{}\".", name))
        } else {
            Ok(format!("No contact named \"{}\" in the cache.", name))
        }
    }
}
