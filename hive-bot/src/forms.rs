//! Declarative modal forms, built from the project field schema.

use hive_discord::component::{ActionRow, TextInput};
use hive_discord::interaction::{InteractionData, InteractionResponse};

use crate::project::{Project, FORM_FIELDS};

pub const CREATE_MODAL_ID: &str = "project-create";
pub const EDIT_MODAL_PREFIX: &str = "project-edit:";

fn rows(prefill: Option<&Project>) -> Vec<ActionRow> {
    FORM_FIELDS
        .iter()
        .map(|field| {
            let mut input = TextInput::new(field.custom_id, field.label)
                .with_placeholder(field.placeholder)
                .with_max_length(field.max_len);
            if !field.required {
                input = input.optional();
            }
            if field.multiline {
                input = input.paragraph();
            }
            if let Some(project) = prefill {
                let value = (field.get)(project);
                if !value.is_empty() {
                    input = input.with_value(value);
                }
            }
            ActionRow::text_input(input)
        })
        .collect()
}

/// Blank form for the Create flow.
pub fn create_modal() -> InteractionResponse {
    InteractionResponse::modal(CREATE_MODAL_ID, "Add a new project", rows(None))
}

/// Prefilled form for the Edit flow; the project id rides in the custom id.
pub fn edit_modal(project: &Project) -> InteractionResponse {
    InteractionResponse::modal(
        format!("{EDIT_MODAL_PREFIX}{}", project.id),
        "Edit project",
        rows(Some(project)),
    )
}

/// The project id carried in an edit-modal custom id.
pub fn parse_edit_id(custom_id: &str) -> Option<u32> {
    custom_id.strip_prefix(EDIT_MODAL_PREFIX)?.parse().ok()
}

/// Apply submitted inputs through the schema setters. Inputs the submission
/// does not carry are left untouched.
pub fn apply_submission(project: &mut Project, data: &InteractionData) {
    for field in FORM_FIELDS {
        if let Some(value) = data.input(field.custom_id) {
            (field.apply)(project, value.trim());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_discord::interaction::Interaction;

    fn submission(values: &[(&str, &str)]) -> InteractionData {
        let rows: Vec<serde_json::Value> = values
            .iter()
            .map(|(id, value)| {
                serde_json::json!({"components": [{"custom_id": id, "value": value}]})
            })
            .collect();
        let raw = serde_json::json!({
            "id": "1", "application_id": "2", "type": 5, "token": "tok",
            "data": {"custom_id": "project-create", "components": rows}
        });
        serde_json::from_value::<Interaction>(raw).unwrap().data.unwrap()
    }

    #[test]
    fn submission_values_are_applied_and_trimmed() {
        let mut project = Project::default();
        let data = submission(&[
            ("project_name", " Alpha "),
            ("project_minted", "y"),
            ("project_description", "desc"),
        ]);
        apply_submission(&mut project, &data);
        assert_eq!(project.name, "Alpha");
        assert!(project.is_minted);
        assert_eq!(project.description, "desc");
        assert_eq!(project.twitter, "");
    }

    #[test]
    fn edit_modal_id_round_trips() {
        let project = Project { id: 12, name: "Alpha".into(), ..Default::default() };
        assert_eq!(parse_edit_id("project-edit:12"), Some(12));
        assert_eq!(parse_edit_id("project-edit:x"), None);
        assert_eq!(parse_edit_id("project-role"), None);

        // The edit modal carries the id in its custom id.
        let json = serde_json::to_value(edit_modal(&project)).unwrap();
        assert_eq!(json["data"]["custom_id"], "project-edit:12");
    }

    #[test]
    fn prefill_reads_through_the_schema_getters() {
        let project = Project {
            id: 3,
            name: "Alpha".into(),
            is_minted: true,
            twitter: "@alpha".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(edit_modal(&project)).unwrap();
        let rows = json["data"]["components"].as_array().unwrap();
        assert_eq!(rows.len(), FORM_FIELDS.len());
        assert_eq!(rows[0]["components"][0]["value"], "Alpha");
        assert_eq!(rows[1]["components"][0]["value"], "Y");
        // Empty description carries no prefill at all.
        assert!(rows[2]["components"][0].get("value").is_none());
        assert_eq!(rows[2]["components"][0]["style"], 2);
        assert_eq!(rows[3]["components"][0]["value"], "@alpha");
    }

    #[test]
    fn create_modal_marks_optional_fields() {
        let json = serde_json::to_value(create_modal()).unwrap();
        let rows = json["data"]["components"].as_array().unwrap();
        assert_eq!(rows[0]["components"][0]["required"], true);
        assert_eq!(rows[0]["components"][0]["max_length"], 20);
        assert_eq!(rows[2]["components"][0]["required"], false);
        assert_eq!(rows[2]["components"][0]["max_length"], 500);
    }
}
