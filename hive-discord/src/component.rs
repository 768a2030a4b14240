//! Message components: action rows holding buttons or modal text inputs.

use serde::Serialize;

/// Button style, as in the Discord component spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary = 1,
    Secondary = 2,
    Success = 3,
    Danger = 4,
}

impl Serialize for ButtonStyle {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Emoji {
    pub name: String,
}

/// An interactive button (component type 2).
#[derive(Debug, Clone, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    kind: u8,
    pub style: ButtonStyle,
    pub label: String,
    pub custom_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<Emoji>,
}

impl Button {
    pub fn new(style: ButtonStyle, label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            kind: 2,
            style,
            label: label.into(),
            custom_id: custom_id.into(),
            emoji: None,
        }
    }

    pub fn with_emoji(mut self, name: impl Into<String>) -> Self {
        self.emoji = Some(Emoji { name: name.into() });
        self
    }
}

/// A single-line or paragraph text input (component type 4, modals only).
#[derive(Debug, Clone, Serialize)]
pub struct TextInput {
    #[serde(rename = "type")]
    kind: u8,
    pub custom_id: String,
    /// 1 = short, 2 = paragraph.
    pub style: u8,
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Prefilled value, used when editing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl TextInput {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: 4,
            custom_id: custom_id.into(),
            style: 1,
            label: label.into(),
            required: true,
            max_length: None,
            placeholder: None,
            value: None,
        }
    }

    pub fn paragraph(mut self) -> Self {
        self.style = 2;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_max_length(mut self, max: u16) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum RowComponent {
    Button(Button),
    TextInput(TextInput),
}

/// An action row (component type 1): the only valid top-level component.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    kind: u8,
    components: Vec<RowComponent>,
}

impl ActionRow {
    /// A row of buttons (up to five).
    pub fn buttons(buttons: Vec<Button>) -> Self {
        Self {
            kind: 1,
            components: buttons.into_iter().map(RowComponent::Button).collect(),
        }
    }

    /// A modal row holding exactly one text input.
    pub fn text_input(input: TextInput) -> Self {
        Self {
            kind: 1,
            components: vec![RowComponent::TextInput(input)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_row_serializes_with_component_types() {
        let row = ActionRow::buttons(vec![
            Button::new(ButtonStyle::Primary, "Role", "project-role").with_emoji("✨"),
            Button::new(ButtonStyle::Danger, "Delete", "project-delete"),
        ]);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["type"], 1);
        assert_eq!(json["components"][0]["type"], 2);
        assert_eq!(json["components"][0]["style"], 1);
        assert_eq!(json["components"][0]["emoji"]["name"], "✨");
        assert_eq!(json["components"][1]["style"], 4);
    }

    #[test]
    fn text_input_row_carries_modal_metadata() {
        let row = ActionRow::text_input(
            TextInput::new("project_name", "Project Name")
                .with_max_length(20)
                .with_placeholder("Project name"),
        );
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["components"][0]["type"], 4);
        assert_eq!(json["components"][0]["max_length"], 20);
        assert_eq!(json["components"][0]["required"], true);
    }
}
