use crate::color::{ColorError, Rgb, contrast_color};
pub use docmind_client::wire::WidgetSettings;
use serde::{Deserialize, Serialize};

/// A partial change to [`WidgetSettings`]. Absent fields are left untouched.
///
/// The backend overwrites the whole settings record on save, so callers fetch
/// the current value, apply the update, and post the merged result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.bot_name.is_none()
            && self.system_prompt.is_none()
            && self.widget_color.is_none()
            && self.header_logo.is_none()
            && self.initial_message.is_none()
    }

    pub fn validate(&self) -> Result<(), ColorError> {
        if let Some(ref color) = self.widget_color {
            Rgb::from_hex(color)?;
        }
        Ok(())
    }

    /// Apply present fields onto `settings`. Colours are stored normalized (`#RRGGBB`).
    pub fn apply_to(&self, settings: &mut WidgetSettings) -> Result<(), ColorError> {
        self.validate()?;
        if let Some(ref name) = self.bot_name {
            settings.bot_name = name.trim().to_string();
        }
        if let Some(ref prompt) = self.system_prompt {
            settings.system_prompt = prompt.clone();
        }
        if let Some(ref color) = self.widget_color {
            settings.widget_color = Rgb::from_hex(color)?.to_hex();
        }
        if let Some(ref logo) = self.header_logo {
            settings.header_logo = logo.trim().to_string();
        }
        if let Some(ref message) = self.initial_message {
            settings.initial_message = message.clone();
        }
        Ok(())
    }
}

/// Foreground colour for the widget header and the user's chat bubbles.
pub fn header_text_color(settings: &WidgetSettings) -> Result<Rgb, ColorError> {
    contrast_color(&settings.widget_color)
}
