//! 应用上下文：启动时一次性构建的依赖集合
//!
//! 编排器、两个专家、结果缓存、会话监管都在这里显式装配并向下传递，
//! 不存在模块级的懒加载全局状态。

use std::path::PathBuf;
use std::sync::Arc;

use crate::agents::{create_calendar_agent, create_gmail_agent, SpecialistAgent};
use crate::config::AppConfig;
use crate::core::{AgentError, SessionSupervisor};
use crate::llm::{create_deepseek_client, LlmClient, MockLlmClient, OpenAiClient};
use crate::routing::Orchestrator;
use crate::store::{
    CalendarStore, ContactStore, EmailStore, InMemoryCalendarStore, InMemoryEmailStore,
    ResultCache, SqliteContactStore,
};

/// 根据配置与环境变量选择 LLM 后端（DeepSeek / OpenAI 兼容 / Mock）
pub(crate) fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    // 有 DeepSeek Key，或配置为 deepseek 且仅有 OpenAI Key 时也走 DeepSeek 兼容端点
    let use_deepseek = std::env::var("DEEPSEEK_API_KEY").is_ok()
        || (provider == "deepseek" && std::env::var("OPENAI_API_KEY").is_ok());
    let use_openai = std::env::var("OPENAI_API_KEY").is_ok() && provider != "deepseek";

    if use_deepseek {
        let model = cfg
            .llm
            .deepseek
            .model
            .clone()
            .unwrap_or_else(|| cfg.llm.model.clone());
        tracing::info!("Using DeepSeek LLM ({})", model);
        Arc::new(create_deepseek_client(Some(&model)))
    } else if use_openai {
        let model = cfg
            .llm
            .openai
            .model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        let base = cfg.llm.base_url.as_deref();
        tracing::info!("Using OpenAI LLM ({})", model);
        Arc::new(OpenAiClient::new(
            base,
            &model,
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        ))
    } else {
        tracing::warn!("No API key set, using Mock LLM (offline demo)");
        Arc::new(MockLlmClient)
    }
}

/// 应用上下文：编排器 + 两个专家 + 共享结果缓存 + 会话监管
pub struct AppContext {
    pub config: AppConfig,
    pub orchestrator: Orchestrator,
    pub gmail_agent: SpecialistAgent,
    pub calendar_agent: SpecialistAgent,
    pub cache: ResultCache,
    pub supervisor: SessionSupervisor,
}

impl AppContext {
    /// 生产构建：LLM 按配置选择；能力面用 InMemory 示例后端（真实 Google 客户端在仓库范围外），
    /// 联系人缓存落 SQLite。
    pub fn from_config(cfg: AppConfig) -> Result<Self, AgentError> {
        let llm = create_llm_from_config(&cfg);
        let email_store: Arc<dyn EmailStore> = Arc::new(InMemoryEmailStore::with_sample_data());
        let calendar_store: Arc<dyn CalendarStore> =
            Arc::new(InMemoryCalendarStore::with_sample_data());
        let contacts_path = cfg
            .tools
            .contacts_db
            .clone()
            .unwrap_or_else(|| PathBuf::from("data/contacts.db"));
        let contact_store: Arc<dyn ContactStore> =
            Arc::new(SqliteContactStore::open(&contacts_path)?);
        Ok(Self::assemble(
            cfg,
            llm,
            email_store,
            calendar_store,
            contact_store,
        ))
    }

    /// 显式装配（测试可注入脚本化 LLM 与内存后端）
    pub fn assemble(
        cfg: AppConfig,
        llm: Arc<dyn LlmClient>,
        email_store: Arc<dyn EmailStore>,
        calendar_store: Arc<dyn CalendarStore>,
        contact_store: Arc<dyn ContactStore>,
    ) -> Self {
        let cache = ResultCache::new();
        let orchestrator = Orchestrator::new(llm.clone(), &cfg.profile);
        let gmail_agent = create_gmail_agent(
            llm.clone(),
            email_store,
            contact_store.clone(),
            cache.clone(),
            &cfg,
        );
        let calendar_agent =
            create_calendar_agent(llm, calendar_store, contact_store, cache.clone(), &cfg);
        Self {
            config: cfg,
            orchestrator,
            gmail_agent,
            calendar_agent,
            cache,
            supervisor: SessionSupervisor::new(),
        }
    }
}
