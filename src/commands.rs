use crate::context::Context;

const SYSTEM_PREFIX: &str = "/system ";
const TRANSLATE_PREFIX: &str = "/translate ";
const IMPROVE_PROMPT: &str = "Please improve my English and explain the corrections:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Clear,
    System(&'a str),
    Translate(&'a str),
    Improve,
}

impl<'a> Command<'a> {
    /// Matches against the raw line. Anything unrecognized, including other
    /// slash-prefixed text, returns `None` and is treated as chat input.
    pub fn parse(line: &'a str) -> Option<Self> {
        if line == "/clear" {
            return Some(Self::Clear);
        }
        if line == "/improve" {
            return Some(Self::Improve);
        }
        if let Some(prompt) = line.strip_prefix(SYSTEM_PREFIX) {
            return Some(Self::System(prompt));
        }
        if let Some(language) = line.strip_prefix(TRANSLATE_PREFIX) {
            return Some(Self::Translate(language));
        }
        None
    }

    /// Mutates `context` and returns the confirmation to print.
    pub fn apply(self, context: &mut Context) -> String {
        match self {
            Self::Clear => {
                context.clear_history();
                "Conversation history cleared!".to_string()
            }
            Self::System(prompt) => {
                context.set_system_prompt(prompt);
                format!("System prompt set: {prompt}")
            }
            Self::Translate(language) => {
                context.set_system_prompt(translate_prompt(language));
                format!("Translation mode set to: {language}")
            }
            Self::Improve => {
                context.set_system_prompt(IMPROVE_PROMPT);
                "English improvement mode activated!".to_string()
            }
        }
    }
}

fn translate_prompt(language: &str) -> String {
    format!("Translate the following text to {language}:")
}

pub const HELP_LINES: &[&str] = &[
    "  /clear - Clear conversation history",
    "  /system <prompt> - Set system prompt",
    "  /translate <language> - Set translation mode",
    "  /improve - Enable English improvement mode",
];
