//! Embed model for announcement and audit messages.

use serde::{Deserialize, Serialize};

/// Embed accent colors (RGB).
pub mod color {
    pub const BLUE: u32 = 0x3498db;
    pub const ORANGE: u32 = 0xe67e22;
    pub const RED: u32 = 0xe74c3c;
}

/// A message embed. Construct with [`Embed::new`] and the `with_*` builders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// ISO-8601 timestamp, rendered by the client next to the footer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    /// Append a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_parts_are_omitted_from_the_wire() {
        let embed = Embed::new().with_title("Alpha");
        let json = serde_json::to_value(&embed).unwrap();
        assert_eq!(json["title"], "Alpha");
        assert!(json.get("fields").is_none());
        assert!(json.get("footer").is_none());
    }

    #[test]
    fn builder_appends_fields_in_order() {
        let embed = Embed::new()
            .field("Minted?", "Yes", false)
            .field("Twitter", "@alpha", true);
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.fields[0].name, "Minted?");
        assert!(embed.fields[1].inline);
    }
}
