mod app;
mod config;
mod events;
mod llm;
mod logging;
mod prompts;
mod session;
mod ui;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use config::Config;
use llm::{AnswerService, GeminiClient};
use ui::conversation::ConversationManager;

#[derive(Parser)]
#[command(name = "dokdo-chat")]
#[command(version)]
#[command(about = "Dokdo chatbot grounded on the vibe_dokdo site", long_about = None)]
struct Cli {
    /// Gemini model to use (overrides config)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Path to config.toml (default: ~/.dokdo-chat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer with its sources
    Ask { question: Vec<String> },
    /// Write a config file with the default settings
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = Config::home_dir()?.join("dokdo-chat.log");
    logging::init(&log_path)?;

    if let Some(Commands::InitConfig) = cli.command {
        let path = match cli.config {
            Some(path) => path,
            None => Config::default_path()?,
        };
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        Config::default().save(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    log::info!("Starting dokdo-chat with model {}", config.model);

    let service: Arc<dyn AnswerService> = Arc::new(GeminiClient::new(config.clone()));
    let manager = ConversationManager::new(service, config.site_url.clone()).with_timestamps(config.ui.show_timestamps);

    match cli.command {
        None => app::run(manager, Duration::from_millis(config.ui.tick_rate_ms)).await,
        Some(Commands::Ask { question }) => ask(manager, &question.join(" ")).await,
        Some(Commands::InitConfig) => Ok(()),
    }
}

/// One turn against a fresh conversation, printed to stdout.
async fn ask(mut manager: ConversationManager, question: &str) -> Result<()> {
    if !manager.submit(question) {
        bail!("질문이 비어 있습니다");
    }
    manager.wait_for_answer().await;

    let Some(reply) = manager.conversation().last() else {
        bail!("no reply recorded");
    };

    // Only the failure notice lacks a source list.
    let Some(sources) = &reply.sources else {
        bail!("{}", reply.text);
    };

    println!("{}", reply.text);
    if !sources.is_empty() {
        println!("\n참고 출처");
        for source in sources {
            println!("  • {} <{}>", source.title, source.uri);
        }
    }
    Ok(())
}
