//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / execute），由 ToolRegistry 按名注册与查找。
//! 每个专家智能体持有自己的注册表：工具集按域划分，专家拿不到域外工具。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（用于 JSON 中的 "tool" 字段）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能；附参数说明）
    fn description(&self) -> &str;

    /// 参数 JSON Schema（供 LLM 生成正确的参数格式）
    /// 默认返回空对象，表示无参数或参数格式不限
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 执行工具；Err 内容会作为 Observation 喂回模型
    async fn execute(&self, args: Value) -> Result<String, String>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// 注册顺序（prompt 中的工具目录按此排序，保持稳定）
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<String, String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| format!("Unknown tool: {name}"))?;
        tool.execute(args).await
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// 生成 prompt 中的「Available tools」段落（按注册顺序）
    pub fn prompt_directory(&self) -> String {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| format!("- {}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopTool;

    #[async_trait]
    impl Tool for NoopTool {
        fn name(&self) -> &str {
            "noop"
        }

        fn description(&self) -> &str {
            "Does nothing."
        }

        async fn execute(&self, _args: Value) -> Result<String, String> {
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(NoopTool);
        assert!(registry.contains("noop"));
        assert_eq!(registry.execute("noop", Value::Null).await.unwrap(), "ok");
        assert!(registry.execute("missing", Value::Null).await.is_err());
    }

    #[test]
    fn directory_follows_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(NoopTool);
        let dir = registry.prompt_directory();
        assert!(dir.starts_with("- noop:"));
    }
}
