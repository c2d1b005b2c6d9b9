//! Process configuration loaded from environment variables.
//!
//! Required variables depend on which tool set is being served; anything
//! missing fails at startup rather than at first use.
//!
//! - `BACKEND_FASTAPI_BASE` - base URL of the project/task REST API
//! - `GEMINI_API_KEY` - API key for the Gemini completion service
//! - `GEMINI_API_BASE` - optional override of the Gemini endpoint (tests)
//! - `PORT` - HTTP listen port (default 4000)

use thiserror::Error;

use crate::tools::ToolSet;

pub const DEFAULT_PORT: u16 = 4000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the project/task backend. Present when backend tools are served.
    pub backend_base: Option<String>,
    /// Gemini API key. Present when planner tools are served.
    pub gemini_api_key: Option<String>,
    /// Override of the Gemini API base URL.
    pub gemini_api_base: Option<String>,
    pub port: u16,
}

impl Config {
    /// Load configuration from the process environment, validating that every
    /// variable the selected tool set needs is present.
    pub fn from_env(tools: ToolSet) -> Result<Self, ConfigError> {
        Self::from_lookup(tools, |name| std::env::var(name).ok())
    }

    fn from_lookup(
        tools: ToolSet,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let backend_base = lookup("BACKEND_FASTAPI_BASE").filter(|v| !v.is_empty());
        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|v| !v.is_empty());
        let gemini_api_base = lookup("GEMINI_API_BASE").filter(|v| !v.is_empty());

        if tools.serves_backend() && backend_base.is_none() {
            return Err(ConfigError::Missing("BACKEND_FASTAPI_BASE"));
        }
        if tools.serves_planner() && gemini_api_key.is_none() {
            return Err(ConfigError::Missing("GEMINI_API_KEY"));
        }

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            backend_base,
            gemini_api_key,
            gemini_api_base,
            port,
        })
    }
}
