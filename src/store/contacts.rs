//! 本地联系人缓存
//!
//! 对「人名 -> 邮箱」的小型键值存储：SQLite 实现做跨进程持久化，
//! InMemory 实现供测试。按名字查询是大小写不敏感的子串匹配。

use std::path::Path;
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::store::types::{Contact, RemoteApiError};

/// 联系人缓存接口：查询 / 写入（upsert）/ 列出 / 删除
pub trait ContactStore: Send + Sync {
    fn find(&self, name: &str) -> Result<Vec<Contact>, RemoteApiError>;
    fn upsert(&self, contact: &Contact) -> Result<(), RemoteApiError>;
    fn all(&self) -> Result<Vec<Contact>, RemoteApiError>;
    /// 返回是否真的删除了记录
    fn remove(&self, name: &str) -> Result<bool, RemoteApiError>;
}

fn db_err(e: rusqlite::Error) -> RemoteApiError {
    RemoteApiError::Unavailable(format!("contacts db: {}", e))
}

/// SQLite 实现（rusqlite bundled，单连接加锁足够：联系人操作低频且极快）
pub struct SqliteContactStore {
    conn: Mutex<Connection>,
}

impl SqliteContactStore {
    pub fn open(path: &Path) -> Result<Self, RemoteApiError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RemoteApiError::Unavailable(format!("contacts db dir: {}", e)))?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS contacts (
                name TEXT PRIMARY KEY COLLATE NOCASE,
                email TEXT NOT NULL,
                notes TEXT,
                added_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query_rows(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Contact>, RemoteApiError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(args, |row| {
                Ok(Contact {
                    name: row.get(0)?,
                    email: row.get(1)?,
                    notes: row.get(2)?,
                    added_at: row.get(3)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }
}

impl ContactStore for SqliteContactStore {
    fn find(&self, name: &str) -> Result<Vec<Contact>, RemoteApiError> {
        let pattern = format!("%{}%", name);
        self.query_rows(
            "SELECT name, email, notes, added_at FROM contacts WHERE name LIKE ?1 ORDER BY name",
            &[&pattern],
        )
    }

    fn upsert(&self, contact: &Contact) -> Result<(), RemoteApiError> {
        self.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO contacts (name, email, notes, added_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name) DO UPDATE SET email = ?2, notes = ?3",
                params![contact.name, contact.email, contact.notes, contact.added_at],
            )
            .map(|_| ())
            .map_err(db_err)
    }

    fn all(&self) -> Result<Vec<Contact>, RemoteApiError> {
        self.query_rows(
            "SELECT name, email, notes, added_at FROM contacts ORDER BY name",
            &[],
        )
    }

    fn remove(&self, name: &str) -> Result<bool, RemoteApiError> {
        let n = self
            .conn
            .lock()
            .unwrap()
            .execute("DELETE FROM contacts WHERE name = ?1 COLLATE NOCASE", params![name])
            .map_err(db_err)?;
        Ok(n > 0)
    }
}

/// 测试用内存实现
#[derive(Default)]
pub struct InMemoryContactStore {
    contacts: RwLock<Vec<Contact>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContactStore for InMemoryContactStore {
    fn find(&self, name: &str) -> Result<Vec<Contact>, RemoteApiError> {
        let needle = name.to_lowercase();
        Ok(self
            .contacts
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn upsert(&self, contact: &Contact) -> Result<(), RemoteApiError> {
        let mut contacts = self.contacts.write().unwrap();
        if let Some(existing) = contacts
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(&contact.name))
        {
            existing.email = contact.email.clone();
            existing.notes = contact.notes.clone();
        } else {
            contacts.push(contact.clone());
        }
        Ok(())
    }

    fn all(&self) -> Result<Vec<Contact>, RemoteApiError> {
        Ok(self.contacts.read().unwrap().clone())
    }

    fn remove(&self, name: &str) -> Result<bool, RemoteApiError> {
        let mut contacts = self.contacts.write().unwrap();
        let before = contacts.len();
        contacts.retain(|c| !c.name.eq_ignore_ascii_case(name));
        Ok(contacts.len() < before)
    }
}

pub fn new_contact(name: &str, email: &str, notes: Option<String>) -> Contact {
    Contact {
        name: name.to_string(),
        email: email.to_string(),
        notes,
        added_at: Utc::now(),
    }
}
