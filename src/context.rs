//! Persisted session state: system prompt, conversation history and modes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::Message;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modes {
    pub translate_to: String,
    pub improve_language: bool,
    pub continuous_mode: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    /// Empty means no system turn is sent.
    pub system_prompt: String,
    /// Chronological; grows without bound on disk.
    pub conversation_history: Vec<Message>,
    pub modes: Modes,
    /// Keys this program does not know, kept so hand edits survive a save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Context {
    pub fn clear_history(&mut self) {
        self.conversation_history.clear();
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
    }

    pub fn record_exchange(&mut self, user_input: impl Into<String>, reply: impl Into<String>) {
        self.conversation_history.push(Message::user(user_input));
        self.conversation_history.push(Message::assistant(reply));
    }
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read context file '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "context file '{}' is corrupt; fix it by hand or run with --clear-context",
        .path.display()
    )]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize context")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write context file '{}'", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the default context.
    pub fn load(&self) -> Result<Context, ContextError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no context file, using defaults");
                return Ok(Context::default());
            }
            Err(source) => {
                return Err(ContextError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let context: Context = serde_json::from_str(&raw).map_err(|source| {
            warn!(path = %self.path.display(), error = %source, "context file is not valid JSON");
            ContextError::CorruptState {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!(
            path = %self.path.display(),
            history_len = context.conversation_history.len(),
            has_system_prompt = !context.system_prompt.is_empty(),
            "loaded context"
        );
        Ok(context)
    }

    /// Writes a sibling temp file and renames it over the target.
    pub fn save(&self, context: &Context) -> Result<(), ContextError> {
        let json = serde_json::to_string_pretty(context).map_err(ContextError::Serialize)?;
        let write_err = |source| ContextError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json).map_err(write_err)?;
        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(write_err(err));
        }

        debug!(
            path = %self.path.display(),
            history_len = context.conversation_history.len(),
            "saved context"
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{Context, ContextError, ContextStore, Modes};
    use crate::model::Message;

    fn store_in(dir: &tempfile::TempDir) -> ContextStore {
        ContextStore::new(dir.path().join(".chatgpt_context.json"))
    }

    #[test]
    fn load_returns_defaults_when_file_is_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = store_in(&dir).load().expect("missing file is not an error");
        assert_eq!(context, Context::default());
        assert!(context.system_prompt.is_empty());
        assert!(context.conversation_history.is_empty());
        assert_eq!(context.modes, Modes::default());
    }

    #[test]
    fn save_then_load_round_trips_non_ascii_and_empty_strings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut context = Context::default();
        context.set_system_prompt("Réponds en français 🇫🇷");
        context.record_exchange("", "こんにちは");
        context.record_exchange("naïve café", "");
        context.modes.translate_to = "Deutsch".to_string();
        context.modes.improve_language = true;

        store.save(&context).expect("save");
        assert_eq!(store.load().expect("load"), context);
    }

    #[test]
    fn saved_file_is_indented_and_keeps_non_ascii_literal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut context = Context::default();
        context.record_exchange("grüß dich", "hallo");
        store.save(&context).expect("save");

        let raw = fs::read_to_string(store.path()).expect("read back");
        assert!(raw.contains("grüß dich"), "non-ASCII was escaped:\n{raw}");
        assert!(raw.contains("\n  \"system_prompt\": \"\""), "unexpected layout:\n{raw}");
        assert!(raw.contains("\"role\": \"user\""), "unexpected layout:\n{raw}");
        let system_at = raw.find("system_prompt").expect("system_prompt key");
        let history_at = raw.find("conversation_history").expect("history key");
        let modes_at = raw.find("modes").expect("modes key");
        assert!(system_at < history_at && history_at < modes_at);
    }

    #[test]
    fn save_overwrites_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut context = Context::default();
        context.record_exchange("one", "two");
        store.save(&context).expect("first save");
        context.clear_history();
        store.save(&context).expect("second save");

        assert!(store.load().expect("load").conversation_history.is_empty());
        let entries: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .collect();
        assert_eq!(entries.len(), 1, "temp file left behind");
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ContextStore::new(dir.path().join("nested/deeper/ctx.json"));
        store.save(&Context::default()).expect("save");
        assert!(store.path().exists());
    }

    #[test]
    fn load_reports_corrupt_state_for_invalid_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").expect("write");

        let err = store.load().expect_err("corrupt file should fail");
        assert!(matches!(err, ContextError::CorruptState { .. }), "got {err:?}");
        assert!(err.to_string().contains("--clear-context"));
    }

    #[test]
    fn load_reports_corrupt_state_for_wrong_types() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(store.path(), r#"{"conversation_history": "oops"}"#).expect("write");
        assert!(matches!(
            store.load(),
            Err(ContextError::CorruptState { .. })
        ));
    }

    #[test]
    fn load_fills_missing_keys_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{"conversation_history": [{"role": "user", "content": "hi"}]}"#,
        )
        .expect("write");

        let context = store.load().expect("load");
        assert_eq!(context.system_prompt, "");
        assert_eq!(context.conversation_history, vec![Message::user("hi")]);
        assert_eq!(context.modes, Modes::default());
    }

    #[test]
    fn record_exchange_appends_user_then_assistant() {
        let mut context = Context::default();
        context.record_exchange("question", "answer");
        assert_eq!(
            context.conversation_history,
            vec![Message::user("question"), Message::assistant("answer")]
        );
    }

    #[test]
    fn clear_history_keeps_system_prompt_and_modes() {
        let mut context = Context::default();
        context.set_system_prompt("Be brief.");
        context.modes.continuous_mode = "on".to_string();
        context.record_exchange("a", "b");

        context.clear_history();

        assert!(context.conversation_history.is_empty());
        assert_eq!(context.system_prompt, "Be brief.");
        assert_eq!(context.modes.continuous_mode, "on");
    }

    #[test]
    fn unknown_keys_survive_load_and_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{
  "system_prompt": "",
  "conversation_history": [{"role": "user", "content": "hi", "name": "bob"}],
  "modes": {"translate_to": "", "improve_language": false, "continuous_mode": "", "tone": "dry"},
  "note": "keep"
}"#,
        )
        .expect("write");

        let mut context = store.load().expect("load");
        context.record_exchange("next", "reply");
        store.save(&context).expect("save");

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).expect("read back"))
                .expect("valid JSON");
        assert_eq!(saved["note"], "keep");
        assert_eq!(saved["modes"]["tone"], "dry");
        assert_eq!(saved["conversation_history"][0]["name"], "bob");
        assert_eq!(saved["conversation_history"][2]["content"], "reply");
        assert!(saved["conversation_history"][2].get("name").is_none());
    }
}
