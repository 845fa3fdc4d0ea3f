use std::fs;
use std::path::Path;

use crate::llm::LlmClientConfig;
use crate::{GatewayError, Result};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_STRUCTURED_INSTRUCTION: &str = "You are an information provider. Create Response as provided Entity with key and list of values for each key";

/// Gateway configuration: env-driven defaults with an optional TOML overlay
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub llm: LlmClientConfig,
    pub server: ServerConfig,
    /// System message sent with every prompt
    pub system_prompt: String,
    /// System message for structured requests
    pub structured_instruction: String,
    pub max_tool_rounds: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("PARLEY_BIND_ADDR")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            llm: LlmClientConfig::default(),
            server: ServerConfig::default(),
            system_prompt: std::env::var("PARLEY_SYSTEM_PROMPT")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            structured_instruction: DEFAULT_STRUCTURED_INSTRUCTION.to_string(),
            max_tool_rounds: 8,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file (path via PARLEY_CONFIG or ./parley.toml),
    /// overlaying values onto env-driven defaults. A missing file is not an error.
    pub fn load() -> Result<Self> {
        let path = std::env::var("PARLEY_CONFIG").unwrap_or_else(|_| "parley.toml".into());
        Self::load_from(path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let default = Self::default();
        let p = path.as_ref();
        if !p.exists() {
            tracing::info!(target: "config", path = %p.display(), "No TOML config found; using defaults/env");
            return Ok(default);
        }
        let raw = fs::read_to_string(p)?;
        Self::from_toml_str(&raw, default)
    }

    /// Parse `raw` and overlay it onto `base`
    pub fn from_toml_str(raw: &str, base: GatewayConfig) -> Result<Self> {
        let overlay = toml::from_str::<GatewayToml>(raw)
            .map_err(|e| GatewayError::Config(format!("invalid TOML: {e}")))?;
        let cfg = overlay.overlay(base);
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.llm.model.is_empty() {
            return Err(GatewayError::Config("llm.model must not be empty".into()));
        }
        if self.llm.base_url.is_empty() {
            return Err(GatewayError::Config("llm.base_url must not be empty".into()));
        }
        if self.max_tool_rounds == 0 {
            return Err(GatewayError::Config("max_tool_rounds must be at least 1".into()));
        }
        Ok(())
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct GatewayToml {
    pub system_prompt: Option<String>,
    pub structured_instruction: Option<String>,
    pub max_tool_rounds: Option<usize>,
    pub llm: Option<LlmToml>,
    pub server: Option<ServerToml>,
}

impl GatewayToml {
    fn overlay(self, mut base: GatewayConfig) -> GatewayConfig {
        if let Some(v) = self.system_prompt {
            base.system_prompt = v;
        }
        if let Some(v) = self.structured_instruction {
            base.structured_instruction = v;
        }
        if let Some(v) = self.max_tool_rounds {
            base.max_tool_rounds = v;
        }
        if let Some(l) = self.llm {
            l.apply(&mut base.llm);
        }
        if let Some(s) = self.server {
            s.apply(&mut base.server);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct LlmToml {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}
impl LlmToml {
    fn apply(self, l: &mut LlmClientConfig) {
        if let Some(v) = self.base_url {
            l.base_url = v;
        }
        if let Some(v) = self.model {
            l.model = v;
        }
        if let Some(v) = self.api_key.filter(|k| !k.is_empty()) {
            l.api_key = Some(v);
        }
        if let Some(v) = self.request_timeout_ms {
            l.request_timeout_ms = v;
        }
        if let Some(v) = self.temperature {
            l.temperature = v.clamp(0.0, 2.0);
        }
        if let Some(v) = self.max_tokens {
            l.max_tokens = Some(v);
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerToml {
    pub bind_addr: Option<String>,
}
impl ServerToml {
    fn apply(self, s: &mut ServerConfig) {
        if let Some(v) = self.bind_addr {
            s.bind_addr = v;
        }
    }
}
