use anyhow::{Result, anyhow};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 600;
const CONTEXT_FILE_NAME: &str = ".chatgpt_context.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model_timeout_secs: u64,
    pub context_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let install_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self::from_env_with(|key| env::var(key).ok(), install_dir.as_deref())
    }

    fn from_env_with(
        mut get_var: impl FnMut(&str) -> Option<String>,
        install_dir: Option<&Path>,
    ) -> Self {
        let api_key = get_var("OPENAI_API_KEY").filter(|key| !key.is_empty());
        let api_base_url = get_var("OPENAI_BASE_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let model_timeout_secs = parse_model_timeout_secs(get_var("MODEL_TIMEOUT_SECS").as_deref());
        let context_file =
            parse_context_file(get_var("CHAT_CONTEXT_FILE").as_deref(), install_dir);

        Self {
            api_key,
            api_base_url,
            model_timeout_secs,
            context_file,
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Please set the OPENAI_API_KEY environment variable."))
    }
}

fn parse_model_timeout_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS)
}

/// The context file lives next to the installed binary unless overridden.
fn parse_context_file(raw: Option<&str>, install_dir: Option<&Path>) -> PathBuf {
    if let Some(path) = raw.map(str::trim).filter(|value| !value.is_empty()) {
        return PathBuf::from(path);
    }

    match install_dir {
        Some(dir) => dir.join(CONTEXT_FILE_NAME),
        None => PathBuf::from(CONTEXT_FILE_NAME),
    }
}
