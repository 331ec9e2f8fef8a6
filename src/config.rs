use clap::Parser;
use reqwest::Url;
use thiserror::Error;

// CLI argument structure, every upstream setting can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "memezy")]
#[command(about = "Meme caption gateway for OpenAI chat and Gemini vision")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Base URL of the OpenAI-compatible API (Azure deployment or api.openai.com)
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT", default_value = "https://api.openai.com/v1")]
    pub openai_endpoint: String,

    #[arg(long, env = "AZURE_OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    // Sent as the api-version query parameter
    #[arg(long, default_value = "2024-02-15-preview")]
    pub openai_api_version: String,

    #[arg(long, default_value = "gpt-4o")]
    pub chat_model: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, default_value = "https://generativelanguage.googleapis.com/v1beta")]
    pub gemini_base_url: String,

    #[arg(long, default_value = "gemini-1.5-flash-latest")]
    pub gemini_model: String,

    // Largest accepted image (decoded), in megabytes
    #[arg(long, default_value_t = 10)]
    pub max_image_mb: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name} '{value}': {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the chat completion upstream.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    // {endpoint}/chat/completions?api-version=...
    pub completions_url: Url,
    pub api_key: Option<String>,
    pub model: String,
}

impl ChatSettings {
    pub fn new(
        endpoint: &str,
        api_key: Option<&str>,
        api_version: &str,
        model: &str,
    ) -> Result<Self, ConfigError> {
        let raw = format!("{}/chat/completions", trim_base(endpoint));
        let completions_url = Url::parse_with_params(&raw, &[("api-version", api_version)])
            .map_err(|e| ConfigError::InvalidUrl {
                name: "openai endpoint",
                value: raw,
                reason: e.to_string(),
            })?;

        Ok(Self {
            completions_url,
            api_key: non_blank(api_key),
            model: model.to_string(),
        })
    }
}

/// Settings for the Gemini caption upstream.
#[derive(Debug, Clone)]
pub struct CaptionSettings {
    // {base}/models/{model}:generateContent, the key travels in a header
    pub generate_url: Url,
    pub api_key: Option<String>,
    pub model: String,
    pub max_image_bytes: usize,
}

impl CaptionSettings {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        max_image_bytes: usize,
    ) -> Result<Self, ConfigError> {
        let raw = format!("{}/models/{}:generateContent", trim_base(base_url), model);
        let generate_url = Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
            name: "gemini base url",
            value: raw,
            reason: e.to_string(),
        })?;

        Ok(Self {
            generate_url,
            api_key: non_blank(api_key),
            model: model.to_string(),
            max_image_bytes,
        })
    }
}

impl Args {
    pub fn chat_settings(&self) -> Result<ChatSettings, ConfigError> {
        ChatSettings::new(
            &self.openai_endpoint,
            self.openai_api_key.as_deref(),
            &self.openai_api_version,
            &self.chat_model,
        )
    }

    pub fn caption_settings(&self) -> Result<CaptionSettings, ConfigError> {
        CaptionSettings::new(
            &self.gemini_base_url,
            self.gemini_api_key.as_deref(),
            &self.gemini_model,
            self.max_image_mb * 1024 * 1024,
        )
    }

    // base64 inflates by 4/3, plus room for the JSON wrapper
    pub fn body_limit(&self) -> usize {
        self.max_image_mb * 1024 * 1024 / 3 * 4 + 64 * 1024
    }
}

// blank keys are treated as unset
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn trim_base(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hosted_services() {
        let args = Args::try_parse_from(["memezy"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.chat_model, "gpt-4o");
        assert_eq!(args.gemini_model, "gemini-1.5-flash-latest");
        assert_eq!(args.caption_settings().unwrap().max_image_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn blank_keys_count_as_missing() {
        let args = Args::try_parse_from([
            "memezy",
            "--openai-api-key",
            "   ",
            "--gemini-api-key",
            "g-key",
        ])
        .unwrap();
        assert!(args.chat_settings().unwrap().api_key.is_none());
        assert_eq!(args.caption_settings().unwrap().api_key.as_deref(), Some("g-key"));
    }

    #[test]
    fn upstream_urls_are_built_once() {
        let args = Args::try_parse_from([
            "memezy",
            "--openai-endpoint",
            "https://example.openai.azure.com/openai/deployments/gpt-4o/",
            "--gemini-base-url",
            "https://generativelanguage.googleapis.com/v1beta/",
        ])
        .unwrap();
        assert_eq!(
            args.chat_settings().unwrap().completions_url.as_str(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-15-preview"
        );
        assert_eq!(
            args.caption_settings().unwrap().generate_url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent"
        );
    }

    #[test]
    fn bad_base_urls_fail_at_startup() {
        let args = Args::try_parse_from([
            "memezy",
            "--openai-endpoint",
            "not a url",
            "--gemini-base-url",
            "::nope",
        ])
        .unwrap();
        assert!(matches!(
            args.chat_settings(),
            Err(ConfigError::InvalidUrl { name: "openai endpoint", .. })
        ));
        assert!(args.caption_settings().is_err());
    }

    #[test]
    fn body_limit_fits_a_max_size_image() {
        let args = Args::try_parse_from(["memezy", "--max-image-mb", "1"]).unwrap();
        assert!(args.body_limit() > 1024 * 1024 * 4 / 3);
    }
}
