//! 会话监管：生命周期与中断管理
//!
//! 持有 CancellationToken；用户 Ctrl+C 时取消当前专家步。取消是协作式的：
//! 只在专家循环的步边界检查，绝不打断进行中的工具调用。

use tokio_util::sync::CancellationToken;

/// 会话级生命周期管理：取消令牌
#[derive(Debug)]
pub struct SessionSupervisor {
    cancel_token: CancellationToken,
}

impl SessionSupervisor {
    pub fn new() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// 触发取消（用户 Ctrl+C）
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// 创建子 token（用于单条指令）
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}

impl Default for SessionSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
