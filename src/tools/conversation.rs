//! 会话控制工具
//!
//! end_conversation 是约定的终止哨兵：专家循环结束后检查工具调用记录里是否出现过它，
//! 出现即认为用户要求结束会话。

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::Tool;

/// 终止哨兵工具名（控制回路据此设置 terminate_requested）
pub const END_CONVERSATION_TOOL: &str = "end_conversation";

/// 结束会话工具：无参数，返回告别确认
pub struct EndConversationTool;

#[async_trait]
impl Tool for EndConversationTool {
    fn name(&self) -> &str {
        END_CONVERSATION_TOOL
    }

    fn description(&self) -> &str {
        "End the conversation. Call this when the user wants to exit, quit, stop, or say goodbye. Args: {}"
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        Ok("Conversation ended. Goodbye!".to_string())
    }
}
