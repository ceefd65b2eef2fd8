//! Engine configuration.
//!
//! All fields have serde defaults, so a config can be deserialized from a
//! partial JSON object and unknown hosts get sensible behavior out of the
//! box.

use serde::{Deserialize, Serialize};

/// How pasted content is treated before it enters the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasteMode {
    /// Full sanitization plus stripping of inline styles and classes.
    #[default]
    Clean,
    /// Text content only; all markup discarded.
    PlainText,
    /// Full sanitization only; author styling survives.
    Raw,
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on retained undo snapshots.
    pub max_history_size: usize,
    /// Hint text shown by the host while the document is empty.
    pub placeholder: String,
    pub paste_mode: PasteMode,
    /// Cap applied to inserted image dimensions; 0 disables the cap.
    pub max_image_width: u32,
    pub max_image_height: u32,
    /// Debounce window for input-driven snapshots, in milliseconds.
    pub update_delay_ms: u64,
    /// Whether trusted-host iframes survive full sanitization.
    pub allow_embeds: bool,
    /// Forwarded to the host surface; the engine only stores it.
    pub spellcheck: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history_size: 100,
            placeholder: String::new(),
            paste_mode: PasteMode::default(),
            max_image_width: 0,
            max_image_height: 0,
            update_delay_ms: 300,
            allow_embeds: true,
            spellcheck: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_history_size, 100);
        assert_eq!(config.update_delay_ms, 300);
        assert_eq!(config.paste_mode, PasteMode::Clean);
        assert!(config.allow_embeds);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"max_history_size": 5, "paste_mode": "plain_text"}"#)
                .unwrap();
        assert_eq!(config.max_history_size, 5);
        assert_eq!(config.paste_mode, PasteMode::PlainText);
        assert_eq!(config.update_delay_ms, 300);
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig {
            placeholder: "Write something".to_string(),
            allow_embeds: false,
            ..EngineConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
