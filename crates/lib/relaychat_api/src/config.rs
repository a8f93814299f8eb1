//! API server configuration.

use std::fmt;
use std::path::PathBuf;

use crate::upstream::{DEFAULT_COMPLETIONS_URL, DEFAULT_MODEL, SYSTEM_PROMPT};

/// Environment variable holding the completion API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Where the bearer credential for the completion API comes from.
#[derive(Clone)]
pub enum Credential {
    /// Read from the named environment variable on every request.
    Env(String),
    /// Fixed value.
    Static(String),
}

impl Credential {
    /// Current credential value, if any.
    pub fn resolve(&self) -> Option<String> {
        match self {
            Credential::Env(var) => std::env::var(var).ok().filter(|v| !v.is_empty()),
            Credential::Static(value) => Some(value.clone()),
        }
    }

    /// Human-readable source, safe to log.
    pub fn source(&self) -> String {
        match self {
            Credential::Env(var) => format!("env:{var}"),
            Credential::Static(_) => "static".into(),
        }
    }
}

// Never print a static key.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source())
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// Chat completions endpoint of the upstream provider.
    pub completions_url: String,
    /// Model identifier sent with every completion request.
    pub model: String,
    /// System instruction prepended to every user message.
    pub system_prompt: String,
    /// Bearer credential for the completion API.
    pub credential: Credential,
    /// Directory with the compiled wasm bundle, served under `/pkg`.
    pub static_dir: Option<PathBuf>,
}

/// Defaults: local bind, OpenAI endpoint and model, key from `OPENAI_API_KEY`.
impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3100".into(),
            completions_url: DEFAULT_COMPLETIONS_URL.into(),
            model: DEFAULT_MODEL.into(),
            system_prompt: SYSTEM_PROMPT.into(),
            credential: Credential::Env(API_KEY_VAR.into()),
            static_dir: None,
        }
    }
}
