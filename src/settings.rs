use serde::{Deserialize, Serialize};

use openai_api::url::DEFAULT_API_BASE_URL;

pub const DEFAULT_MODEL: &str = "lmstudio-community/Meta-Llama-3-8B-Instruct";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful, friendly assistant. Answer clearly and concisely.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

/// Flat configuration record owned by the settings collaborator; the session
/// core reads it and never writes it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    pub api_base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub theme: Theme,
    pub use_proxy: bool,
    pub proxy_origin: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            theme: Theme::Dark,
            use_proxy: false,
            proxy_origin: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ChatSettings;

    #[test]
    fn settings_decode_tolerates_missing_fields() {
        let settings: ChatSettings =
            serde_json::from_str(r#"{"model":"custom"}"#).expect("partial settings");
        assert_eq!(settings.model, "custom");
        assert_eq!(settings.max_tokens, ChatSettings::default().max_tokens);
    }

    #[test]
    fn settings_round_trip_uses_camel_case_keys() {
        let value = serde_json::to_value(ChatSettings::default()).expect("serialize");
        assert!(value.get("apiBaseUrl").is_some());
        assert!(value.get("maxTokens").is_some());
        assert!(value.get("useProxy").is_some());
    }
}
