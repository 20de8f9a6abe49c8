use serde::{Deserialize, Serialize};

/// Font stack used when the impact font setting is on.
pub const IMPACT_FONT_FAMILY: &str = "Impact,sans-serif";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub background: String,
    /// Fill for words whose row carries no color.
    pub text_color: String,
    pub halo_light: String,
    pub halo_dark: String,
    pub selection_fill: String,
    pub selection_border: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "\"Segoe UI\", Roboto, Helvetica, Arial, sans-serif".to_string(),
            background: "#FFFFFF".to_string(),
            text_color: "#1C2430".to_string(),
            halo_light: "#FFFFFF".to_string(),
            halo_dark: "#000000".to_string(),
            selection_fill: "rgba(0, 0, 0, 0.1)".to_string(),
            selection_border: "#3050EF".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            background: "#1C2430".to_string(),
            text_color: "#F8FAFF".to_string(),
            halo_light: "#FFFFFF".to_string(),
            halo_dark: "#000000".to_string(),
            selection_fill: "rgba(255, 255, 255, 0.15)".to_string(),
            selection_border: "#7A8AA6".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "light" | "default" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }

    /// Font stack for one pass.
    pub fn word_font(&self, use_impact_font: bool) -> &str {
        if use_impact_font {
            IMPACT_FONT_FAMILY
        } else {
            &self.font_family
        }
    }
}
