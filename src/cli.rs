use clap::Parser;

use crate::config::DEFAULT_MODEL;

#[derive(Debug, Parser)]
#[command(name = "gptctx", version, about = "Chat with OpenAI GPT models.")]
pub struct Cli {
    /// Model name to use
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Strip basic markdown symbols from responses
    #[arg(long)]
    pub strip_markdown: bool,

    /// Set the system prompt and exit (e.g. "Translate to English")
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    pub set_system: Option<String>,

    /// Clear conversation history and system prompt, then exit
    #[arg(long)]
    pub clear_context: bool,
}

/// Flags that act on the stored context and exit without chatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneShot {
    ClearContext,
    SetSystem(String),
}

impl Cli {
    pub fn one_shot(&self) -> Option<OneShot> {
        if self.clear_context {
            return Some(OneShot::ClearContext);
        }
        self.set_system
            .as_ref()
            .filter(|prompt| !prompt.is_empty())
            .map(|prompt| OneShot::SetSystem(prompt.clone()))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, OneShot};
    use crate::config::DEFAULT_MODEL;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gptctx").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn defaults_enter_interactive_chat() {
        let cli = parse(&[]);
        assert_eq!(cli.model, DEFAULT_MODEL);
        assert!(!cli.strip_markdown);
        assert_eq!(cli.one_shot(), None);
    }

    #[test]
    fn reads_model_and_strip_flag() {
        let cli = parse(&["--model", "gpt-4o", "--strip-markdown"]);
        assert_eq!(cli.model, "gpt-4o");
        assert!(cli.strip_markdown);
    }

    #[test]
    fn set_system_is_a_one_shot() {
        let cli = parse(&["--set-system", "Improve my English"]);
        assert_eq!(
            cli.one_shot(),
            Some(OneShot::SetSystem("Improve my English".to_string()))
        );
    }

    #[test]
    fn set_system_accepts_leading_hyphen() {
        let cli = parse(&["--set-system", "- answer in bullets"]);
        assert_eq!(
            cli.one_shot(),
            Some(OneShot::SetSystem("- answer in bullets".to_string()))
        );
    }

    #[test]
    fn empty_set_system_is_ignored() {
        let cli = parse(&["--set-system", ""]);
        assert_eq!(cli.one_shot(), None);
    }

    #[test]
    fn clear_context_wins_over_set_system() {
        let cli = parse(&["--set-system", "x", "--clear-context"]);
        assert_eq!(cli.one_shot(), Some(OneShot::ClearContext));
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["gptctx", "--verbose"]).is_err());
    }
}
