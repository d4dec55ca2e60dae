//! 能力面层：远端接口（Email / Calendar）、本地联系人缓存、序号解析用的结果缓存

pub mod cache;
pub mod contacts;
pub mod memory;
pub mod traits;
pub mod types;

pub use cache::{resolve_ordinal, ResultCache};
pub use contacts::{new_contact, ContactStore, InMemoryContactStore, SqliteContactStore};
pub use memory::{InMemoryCalendarStore, InMemoryEmailStore};
pub use traits::{CalendarStore, EmailStore};
pub use types::{
    Contact, EmailDetail, EmailSummary, EventDetail, EventSummary, NewEvent, RemoteApiError,
    RsvpStatus,
};
