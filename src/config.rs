//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `MAGPIE__*` 覆盖（双下划线表示嵌套，如 `MAGPIE__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub profile: ProfileSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

/// [app] 段：应用名、对话轮数上限、上下文窗口
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 对话历史保留轮数（短期记忆）
    #[serde(default = "default_max_context_turns")]
    pub max_context_turns: usize,
    /// 构建 LLM 上下文时取最近 N 条消息
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

fn default_max_context_turns() -> usize {
    20
}

fn default_context_window() -> usize {
    5
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmSection {
    /// 后端：deepseek / openai；优先级由 API Key 与 provider 共同决定
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default)]
    pub deepseek: LlmDeepSeekSection,
    #[serde(default)]
    pub openai: LlmOpenAiSection,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmDeepSeekSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmOpenAiSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmTimeoutsSection {
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

fn default_request_timeout() -> u64 {
    60
}

/// [profile] 段：助手以谁的身份行动（注入各智能体 system prompt）
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSection {
    #[serde(default = "default_user_name")]
    pub user_name: String,
    #[serde(default = "default_user_email")]
    pub user_email: String,
    /// 用户所在时区（IANA 名称或缩写），提示词中用于解释裸时间
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_user_name() -> String {
    "Magpie User".to_string()
}

fn default_user_email() -> String {
    "me@example.com".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            user_email: default_user_email(),
            timezone: default_timezone(),
        }
    }
}

/// [tools] 段：工具超时、专家步数上限、联系人库路径
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// 单条指令内专家智能体最多执行的工具步数，防止死循环
    #[serde(default = "default_max_agent_steps")]
    pub max_agent_steps: usize,
    /// 联系人缓存 SQLite 文件；未设置时用 data/contacts.db
    pub contacts_db: Option<PathBuf>,
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_max_agent_steps() -> usize {
    8
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            llm: LlmSection::default(),
            profile: ProfileSection::default(),
            tools: ToolsSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 MAGPIE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 MAGPIE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("MAGPIE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_usable() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.context_window, 5);
        assert_eq!(cfg.tools.max_agent_steps, 8);
        assert_eq!(cfg.profile.timezone, "UTC");
    }
}
