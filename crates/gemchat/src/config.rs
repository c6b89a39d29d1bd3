//! Settings read from environment variables.

use std::env;
use std::fmt::{self, Display, Formatter};

use gemchat_core::{ModelConfig, ModelSettings, ModelVariant};
use gemchat_gemini_model::{GeminiConfig, GeminiConfigBuilder};
use gemchat_model::Credential;

const API_KEY: &str = "GEMINI_API_KEY";
const VISION_API_KEY: &str = "GEMINI_VISION_API_KEY";
const BASE_URL: &str = "GEMINI_BASE_URL";
const MODEL: &str = "GEMINI_MODEL";
const VISION_MODEL: &str = "GEMINI_VISION_MODEL";

/// Error returned when a required variable is missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingVar(&'static str);

impl Display for MissingVar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} environment variable is not set", self.0)
    }
}

impl std::error::Error for MissingVar {}

/// Settings read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvConfig {
    pro: ModelConfig,
    vision: ModelConfig,
    base_url: Option<String>,
}

impl EnvConfig {
    /// Reads the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, MissingVar> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MissingVar>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = lookup(API_KEY).ok_or(MissingVar(API_KEY))?;
        let vision_key = lookup(VISION_API_KEY).unwrap_or_else(|| {
            debug!("{VISION_API_KEY} is not set, using {API_KEY}");
            api_key.clone()
        });
        let model_config =
            |variant: ModelVariant, name_var: &str, key: String| ModelConfig {
                model_name: lookup(name_var).unwrap_or_else(|| {
                    variant.default_model_name().to_owned()
                }),
                credential: Credential::new(key),
            };

        let pro = model_config(ModelVariant::Pro, MODEL, api_key);
        let vision =
            model_config(ModelVariant::Vision, VISION_MODEL, vision_key);
        Ok(Self {
            pro,
            vision,
            base_url: lookup(BASE_URL),
        })
    }

    /// Returns the model settings, with the text-only model selected.
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings::default()
            .with_config(ModelVariant::Pro, self.pro.clone())
            .with_config(ModelVariant::Vision, self.vision.clone())
    }

    /// Returns the provider configuration.
    pub fn gemini_config(&self) -> GeminiConfig {
        let mut builder = GeminiConfigBuilder::new();
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url.clone());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<EnvConfig, MissingVar> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_required_key() {
        let err = config_from(&[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "GEMINI_API_KEY environment variable is not set"
        );
        assert!(config_from(&[(API_KEY, " ")]).is_err());
    }

    #[test]
    fn test_defaults() {
        let settings =
            config_from(&[(API_KEY, "key")]).unwrap().model_settings();
        assert_eq!(settings.active(), ModelVariant::Pro);
        for variant in [ModelVariant::Pro, ModelVariant::Vision] {
            let config = settings.config(variant);
            assert_eq!(config.model_name, variant.default_model_name());
            assert_eq!(config.credential.expose(), "key");
        }
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            (API_KEY, "key"),
            (VISION_API_KEY, "vision-key"),
            (MODEL, "gemini-1.5-flash"),
            (VISION_MODEL, "gemini-1.5-pro"),
            (BASE_URL, "http://localhost:8080/v1beta"),
        ])
        .unwrap();
        let settings = config.model_settings();
        assert_eq!(
            settings.config(ModelVariant::Pro).model_name,
            "gemini-1.5-flash"
        );
        let vision = settings.config(ModelVariant::Vision);
        assert_eq!(vision.model_name, "gemini-1.5-pro");
        assert_eq!(vision.credential.expose(), "vision-key");
        assert_eq!(
            config.base_url.as_deref(),
            Some("http://localhost:8080/v1beta")
        );
    }
}
