//! 会话图层：状态、固定拓扑图、节点函数与单轮执行器

pub mod builder;
pub mod nodes;
pub mod runner;
pub mod state;

pub use builder::{ConversationGraph, GraphNode};
pub use runner::{ConversationRunner, TurnResult};
pub use state::ConversationState;
