//! 路由层：编排器（意图分类 / 任务拆解）与路由决策协议

pub mod decision;
pub mod orchestrator;

pub use decision::{AgentType, ExecutionOrder, RoutingDecision};
pub use orchestrator::Orchestrator;
