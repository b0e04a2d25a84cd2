use anyhow::{Context as _, Result};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::commands::{Command, HELP_LINES};
use crate::context::{Context, ContextStore};
use crate::model_gateway::ModelGateway;
use crate::session::ChatSession;

pub fn print_banner<W: Write>(output: &mut W, model: &str, context: &Context) -> Result<()> {
    writeln!(output, "Using model: {model}")?;
    if !context.system_prompt.is_empty() {
        writeln!(output, "System prompt: {}", context.system_prompt)?;
    }
    writeln!(output, "Special commands:")?;
    for line in HELP_LINES {
        writeln!(output, "{line}")?;
    }
    writeln!(output, "Press Ctrl+C to exit.\n")?;
    Ok(())
}

/// Reads lines until end of input. Local commands and chat turns both
/// save the context before the next prompt.
pub async fn run_repl<G, R, W>(
    session: &ChatSession<'_, G>,
    store: &ContextStore,
    context: &mut Context,
    mut input: R,
    output: &mut W,
) -> Result<()>
where
    G: ModelGateway,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        write!(output, "You: ")?;
        output.flush().context("Failed to flush stdout")?;

        let mut raw = String::new();
        let read = input
            .read_line(&mut raw)
            .await
            .context("Failed to read stdin")?;
        if read == 0 {
            writeln!(output, "\nBye!")?;
            return Ok(());
        }

        let line = strip_line_ending(&raw);
        if line.trim().is_empty() {
            continue;
        }

        if let Some(command) = Command::parse(line) {
            let message = command.apply(context);
            store.save(context)?;
            info!(command = ?command, "applied local command");
            writeln!(output, "{message}")?;
            continue;
        }
        if line.starts_with('/') {
            debug!(line, "unrecognized command, sending as chat input");
        }

        let reply = session.run_turn(context, line).await?;
        writeln!(output, "GPT: {reply}")?;
        store.save(context)?;
    }
}

fn strip_line_ending(raw: &str) -> &str {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    line.strip_suffix('\r').unwrap_or(line)
}
