//! Run configuration.

use serde::{Deserialize, Serialize};

/// A user-defined text mod: a named entry showing a fixed line of text.
///
/// Text mods drive both built-in modules: the registry hook adds them to the client's
/// mod set under their [`id`](TextMod::id), and the language mapper translates that id
/// back to the display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMod {
    /// Display name shown in the client.
    pub name: String,
    /// The text the mod renders.
    pub text: String,
}

impl TextMod {
    /// A text mod with the given display name and content.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        TextMod {
            name: name.into(),
            text: text.into(),
        }
    }

    /// The registration id, derived from the display name.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}-custom", self.name.to_lowercase())
    }
}

/// Top-level configuration of an engine run.
///
/// Deserializes leniently: absent fields keep their defaults, so an empty document is a
/// valid configuration with both built-in modules enabled and nothing to inject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether the mod registry hook is registered.
    pub enable_mod_registry: bool,
    /// Whether the language mapper hook is registered.
    pub enable_lang_mapper: bool,
    /// User-defined text mods to inject.
    pub text_mods: Vec<TextMod>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            enable_mod_registry: true,
            enable_lang_mapper: true,
            text_mods: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_lenient() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert!(config.enable_mod_registry);
        assert!(config.enable_lang_mapper);
        assert!(config.text_mods.is_empty());
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"enable_lang_mapper": false, "text_mods": [{"name": "Uptime", "text": "up 3h"}]}"#,
        )
        .unwrap();
        assert!(config.enable_mod_registry);
        assert!(!config.enable_lang_mapper);
        assert_eq!(config.text_mods[0].name, "Uptime");
    }

    #[test]
    fn test_text_mod_id_derivation() {
        assert_eq!(TextMod::new("Uptime", "up").id(), "uptime-custom");
        assert_eq!(TextMod::new("FPS Boost", "on").id(), "fps boost-custom");
    }
}
