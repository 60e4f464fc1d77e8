use super::base::ProviderConfig;
use anyhow::{anyhow, Result};

pub const DEFAULT_HOST: &str = "https://api.openai.com/";

/// Connection settings for the OpenAI chat-completions API. The key is the
/// only required value; everything below `main` receives this as a plain
/// struct and never touches the environment itself.
pub struct OpenAiProviderConfig {
    pub api_key: String,
    pub host: String,
}

impl OpenAiProviderConfig {
    pub fn new(api_key: String, host: String) -> Self {
        Self { api_key, host }
    }
}

impl ProviderConfig for OpenAiProviderConfig {
    fn from_env() -> Result<Self> {
        let api_key = Self::get_env("OPENAI_API_KEY", true, None)?
            .ok_or_else(|| anyhow!("OpenAI API key should be present"))?;

        let host = Self::get_env("OPENAI_API_HOST", false, Some(DEFAULT_HOST.to_string()))?
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        Ok(Self::new(api_key, host))
    }
}
