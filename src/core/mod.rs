//! 核心层：错误类型、应用上下文、会话监管

pub mod context;
pub mod error;
pub mod session_supervisor;

pub use context::AppContext;
pub use error::AgentError;
pub use session_supervisor::SessionSupervisor;
