//! 专家智能体层：执行循环与 Gmail / Calendar 两个专家的装配

pub mod calendar;
pub mod gmail;
pub mod specialist;

pub use calendar::{create_calendar_agent, CALENDAR_AGENT_NAME};
pub use gmail::{create_gmail_agent, GMAIL_AGENT_NAME};
pub use specialist::{
    parse_specialist_output, SpecialistAgent, SpecialistOutcome, SpecialistStep, ToolCall,
};

use crate::config::ProfileSection;

/// 提示词文件覆盖：config/prompts/{name}.txt 存在则优先于内置常量
pub(crate) fn load_prompt_override(name: &str) -> Option<String> {
    [
        format!("config/prompts/{}.txt", name),
        format!("../config/prompts/{}.txt", name),
    ]
    .into_iter()
    .find_map(|p| std::fs::read_to_string(p).ok())
}

/// 把 profile 字段注入提示词模板
pub(crate) fn render_profile(template: &str, profile: &ProfileSection) -> String {
    template
        .replace("{user_name}", &profile.user_name)
        .replace("{user_email}", &profile.user_email)
        .replace("{timezone}", &profile.timezone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_profile_fills_all_placeholders() {
        let profile = ProfileSection {
            user_name: "Ada".into(),
            user_email: "ada@example.com".into(),
            timezone: "PST".into(),
        };
        let out = render_profile("I am {user_name} <{user_email}> in {timezone}", &profile);
        assert_eq!(out, "I am Ada <ada@example.com> in PST");
    }
}
