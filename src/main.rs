//! Magpie - Rust 个人邮件/日历智能体
//!
//! 入口：初始化日志、加载配置、构建应用上下文，跑逐行读入的对话主循环。

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use magpie::config::load_config;
use magpie::core::AppContext;
use magpie::graph::{ConversationGraph, ConversationRunner};
use magpie::memory::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        Default::default()
    });

    let ctx = AppContext::from_config(cfg).context("Failed to build application context")?;
    let mut runner = ConversationRunner::new(std::sync::Arc::new(ctx));
    let session_id = SessionStore::new_session_id();

    println!("Magpie - Gmail & Calendar assistant");
    println!("Type your request, or \"quit\" to exit.\n");
    tracing::debug!("graph topology:\n{}", ConversationGraph::mermaid());

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break, // EOF
            },
            _ = tokio::signal::ctrl_c() => {
                // Ctrl+C：取消进行中的步（协作式），结束会话
                runner.context().supervisor.cancel();
                println!("\nGoodbye!");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let result = runner.run_turn(&session_id, &line).await;
        for reply in &result.replies {
            println!("\nMagpie: {}\n", reply);
        }
        if result.terminated {
            println!("Goodbye!");
            break;
        }
    }

    Ok(())
}
