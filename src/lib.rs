pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod logging;
pub mod markdown;
pub mod model;
pub mod model_gateway;
pub mod providers;
pub mod repl;
pub mod session;

use anyhow::{Context as _, Result};
use clap::Parser;
use reqwest::Client;
use std::io;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::info;

use cli::{Cli, OneShot};
use config::Config;
use context::{Context, ContextStore};
use model_gateway::HostModelGateway;
use repl::{print_banner, run_repl};
use session::ChatSession;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    // Held to the end of `run` so the file writer flushes before exit.
    let _log_guard = logging::init();

    let cli = Cli::parse();
    let cfg = Config::from_env();
    info!(
        model = %cli.model,
        strip_markdown = cli.strip_markdown,
        context_file = %cfg.context_file.display(),
        "loaded runtime configuration"
    );
    let store = ContextStore::new(cfg.context_file.clone());

    if let Some(action) = cli.one_shot() {
        let message = run_one_shot(&store, action)?;
        println!("{message}");
        return Ok(());
    }

    let mut context = store.load()?;
    cfg.require_api_key()?;

    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.model_timeout_secs))
        .build()
        .context("Failed to initialize HTTP client")?;
    let gateway = HostModelGateway::new(&client, &cfg);
    let session = ChatSession::new(&gateway, cli.model, cli.strip_markdown);

    let mut stdout = io::stdout();
    print_banner(&mut stdout, session.model(), &context)?;

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = run_repl(&session, &store, &mut context, stdin, &mut stdout) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nBye!");
            Ok(())
        }
    }
}

/// Applies a one-shot flag and returns the confirmation line.
///
/// Clearing never reads the old file, so it also recovers from a corrupt one.
pub fn run_one_shot(store: &ContextStore, action: OneShot) -> Result<String> {
    match action {
        OneShot::ClearContext => {
            store.save(&Context::default())?;
            info!(path = %store.path().display(), "context cleared");
            Ok("Context cleared!".to_string())
        }
        OneShot::SetSystem(prompt) => {
            let mut context = store.load()?;
            context.set_system_prompt(prompt.as_str());
            store.save(&context)?;
            info!(path = %store.path().display(), "system prompt updated");
            Ok(format!("System prompt set: {prompt}"))
        }
    }
}
