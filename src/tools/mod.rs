//! 工具箱：注册表、执行器、各域工具集与参数解析辅助

pub mod calendar;
pub mod contacts;
pub mod conversation;
pub mod executor;
pub mod gmail;
pub mod registry;
pub mod schema;

pub use conversation::{EndConversationTool, END_CONVERSATION_TOOL};
pub use executor::ToolExecutor;
pub use registry::{Tool, ToolRegistry};
pub use schema::tool_call_schema_json;

use serde_json::Value;

/// 取必填字符串参数
pub(crate) fn required_str(args: &Value, key: &str) -> Result<String, String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("Missing required argument '{key}'"))
}

/// 取可选字符串参数
pub(crate) fn optional_str(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// 取必填正整数参数（序号等）
pub(crate) fn required_usize(args: &Value, key: &str) -> Result<usize, String> {
    args.get(key)
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .ok_or_else(|| format!("Missing required argument '{key}' (number)"))
}

/// 取可选正整数参数
pub(crate) fn optional_usize(args: &Value, key: &str) -> Option<usize> {
    args.get(key).and_then(|v| v.as_u64()).map(|n| n as usize)
}

/// 取字符串数组参数；也容忍逗号分隔的单个字符串
pub(crate) fn string_array(args: &Value, key: &str) -> Vec<String> {
    match args.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
