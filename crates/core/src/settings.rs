use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use gemchat_model::Credential;
use serde::{Deserialize, Serialize};

/// The models a chat can talk to.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// The text-only model.
    #[default]
    Pro,
    /// The multimodal model, which also reads images.
    Vision,
}

impl ModelVariant {
    /// Returns the model name used when none is configured.
    #[inline]
    pub fn default_model_name(self) -> &'static str {
        match self {
            ModelVariant::Pro => "gemini-pro",
            ModelVariant::Vision => "gemini-pro-vision",
        }
    }

    /// Returns `true` if the model accepts images.
    #[inline]
    pub fn supports_images(self) -> bool {
        matches!(self, ModelVariant::Vision)
    }
}

impl Display for ModelVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::Pro => f.write_str("pro"),
            ModelVariant::Vision => f.write_str("vision"),
        }
    }
}

/// Error returned when parsing an unknown [`ModelVariant`] name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownVariant(String);

impl Display for UnknownVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model `{}`, expected `pro` or `vision`", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for ModelVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pro" => Ok(ModelVariant::Pro),
            "vision" => Ok(ModelVariant::Vision),
            _ => Err(UnknownVariant(s.to_owned())),
        }
    }
}

/// How to reach one model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelConfig {
    /// The name sent to the provider.
    pub model_name: String,
    /// The API key for this model.
    pub credential: Credential,
}

impl ModelConfig {
    /// Creates a config for `variant` with its default model name and no
    /// credential.
    #[inline]
    pub fn for_variant(variant: ModelVariant) -> Self {
        Self {
            model_name: variant.default_model_name().to_owned(),
            credential: Credential::default(),
        }
    }
}

/// The selected model and the per-model configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelSettings {
    active: ModelVariant,
    pro: ModelConfig,
    vision: ModelConfig,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            active: ModelVariant::default(),
            pro: ModelConfig::for_variant(ModelVariant::Pro),
            vision: ModelConfig::for_variant(ModelVariant::Vision),
        }
    }
}

impl ModelSettings {
    /// Creates settings where every model uses the same API key.
    #[inline]
    pub fn with_credential<S: Into<String>>(key: S) -> Self {
        let credential = Credential::new(key);
        let mut settings = Self::default();
        settings.pro.credential = credential.clone();
        settings.vision.credential = credential;
        settings
    }

    /// Sets the active model.
    #[inline]
    pub fn with_active(mut self, variant: ModelVariant) -> Self {
        self.active = variant;
        self
    }

    /// Replaces the configuration of one model.
    #[inline]
    pub fn with_config(
        mut self,
        variant: ModelVariant,
        config: ModelConfig,
    ) -> Self {
        *self.config_mut(variant) = config;
        self
    }

    /// Returns the active model.
    #[inline]
    pub fn active(&self) -> ModelVariant {
        self.active
    }

    /// Returns the configuration of the active model.
    #[inline]
    pub fn active_config(&self) -> &ModelConfig {
        self.config(self.active)
    }

    /// Returns the configuration of `variant`.
    #[inline]
    pub fn config(&self, variant: ModelVariant) -> &ModelConfig {
        match variant {
            ModelVariant::Pro => &self.pro,
            ModelVariant::Vision => &self.vision,
        }
    }

    pub(crate) fn set_active(&mut self, variant: ModelVariant) {
        self.active = variant;
    }

    pub(crate) fn config_mut(
        &mut self,
        variant: ModelVariant,
    ) -> &mut ModelConfig {
        match variant {
            ModelVariant::Pro => &mut self.pro,
            ModelVariant::Vision => &mut self.vision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ModelSettings::default();
        assert_eq!(settings.active(), ModelVariant::Pro);
        assert_eq!(settings.active_config().model_name, "gemini-pro");
        assert_eq!(
            settings.config(ModelVariant::Vision).model_name,
            "gemini-pro-vision"
        );
        assert!(settings.active_config().credential.is_empty());
        assert!(!ModelVariant::Pro.supports_images());
        assert!(ModelVariant::Vision.supports_images());
    }

    #[test]
    fn test_builder() {
        let settings = ModelSettings::with_credential("key")
            .with_active(ModelVariant::Vision)
            .with_config(
                ModelVariant::Pro,
                ModelConfig {
                    model_name: "gemini-1.5-pro".to_owned(),
                    credential: Credential::new("other"),
                },
            );
        assert_eq!(settings.active_config().credential.expose(), "key");
        assert_eq!(
            settings.config(ModelVariant::Pro).model_name,
            "gemini-1.5-pro"
        );
    }

    #[test]
    fn test_parse_variant() {
        assert_eq!("pro".parse(), Ok(ModelVariant::Pro));
        assert_eq!(" Vision ".parse(), Ok(ModelVariant::Vision));
        assert!("ultra".parse::<ModelVariant>().is_err());
        assert_eq!(ModelVariant::Vision.to_string(), "vision");
    }
}
