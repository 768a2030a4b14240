//! The project record and its static field schema.
//!
//! The schema table is the single description of project fields: the form
//! builds its inputs from it, submissions are applied through it, and the
//! audit log diffs and enumerates with it. Adding a field means adding one
//! table entry.

use serde::{Deserialize, Serialize};

use hive_discord::types::{ChannelId, MessageId, RoleId};

/// One community sub-group and the external resources backing it.
///
/// `role_id` and `channel_id` are both written during creation before the
/// record is ever persisted; `message_id` stays zero until the announcement
/// has been published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub discord: String,
    #[serde(default)]
    pub is_minted: bool,
    #[serde(default)]
    pub message_id: MessageId,
    #[serde(default)]
    pub role_id: RoleId,
    #[serde(default)]
    pub channel_id: ChannelId,
}

/// A form-editable field: label and modal metadata plus accessors.
pub struct FieldSpec {
    pub label: &'static str,
    pub custom_id: &'static str,
    pub placeholder: &'static str,
    pub required: bool,
    pub max_len: u16,
    pub multiline: bool,
    pub get: fn(&Project) -> String,
    pub apply: fn(&mut Project, &str),
}

/// A read-only field as the audit log sees it.
pub struct DisplaySpec {
    pub label: &'static str,
    pub get: fn(&Project) -> String,
}

fn get_name(p: &Project) -> String {
    p.name.clone()
}
fn set_name(p: &mut Project, v: &str) {
    p.name = v.to_string();
}

fn get_minted(p: &Project) -> String {
    if p.is_minted { "Y" } else { "N" }.to_string()
}
fn set_minted(p: &mut Project, v: &str) {
    p.is_minted = v.eq_ignore_ascii_case("y");
}

fn get_description(p: &Project) -> String {
    p.description.clone()
}
fn set_description(p: &mut Project, v: &str) {
    p.description = v.to_string();
}

fn get_twitter(p: &Project) -> String {
    p.twitter.clone()
}
fn set_twitter(p: &mut Project, v: &str) {
    p.twitter = v.to_string();
}

fn get_discord(p: &Project) -> String {
    p.discord.clone()
}
fn set_discord(p: &mut Project, v: &str) {
    p.discord = v.to_string();
}

fn get_id(p: &Project) -> String {
    p.id.to_string()
}

// Unprovisioned references render as empty so the audit log shows its
// placeholder instead of a zero id.
fn get_message_id(p: &Project) -> String {
    if p.message_id.0 == 0 { String::new() } else { p.message_id.to_string() }
}
fn get_role_id(p: &Project) -> String {
    if p.role_id.0 == 0 { String::new() } else { p.role_id.to_string() }
}
fn get_channel_id(p: &Project) -> String {
    if p.channel_id.0 == 0 { String::new() } else { p.channel_id.to_string() }
}

/// The five fields the create/edit modal exposes, in form order.
pub const FORM_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        label: "Project Name",
        custom_id: "project_name",
        placeholder: "Project name",
        required: true,
        max_len: 20,
        multiline: false,
        get: get_name,
        apply: set_name,
    },
    FieldSpec {
        label: "Minted?",
        custom_id: "project_minted",
        placeholder: "Y/N",
        required: true,
        max_len: 1,
        multiline: false,
        get: get_minted,
        apply: set_minted,
    },
    FieldSpec {
        label: "Description",
        custom_id: "project_description",
        placeholder: "Optional description of project",
        required: false,
        max_len: 500,
        multiline: true,
        get: get_description,
        apply: set_description,
    },
    FieldSpec {
        label: "Twitter",
        custom_id: "project_twitter",
        placeholder: "Twitter link",
        required: false,
        max_len: 40,
        multiline: false,
        get: get_twitter,
        apply: set_twitter,
    },
    FieldSpec {
        label: "Discord",
        custom_id: "project_discord",
        placeholder: "Discord link",
        required: false,
        max_len: 40,
        multiline: false,
        get: get_discord,
        apply: set_discord,
    },
];

/// Every field, in the order audit embeds enumerate them. The diff walks
/// this list too; fields outside the form never change during an edit, so
/// they simply never produce a change entry there.
pub const AUDIT_FIELDS: &[DisplaySpec] = &[
    DisplaySpec { label: "Id", get: get_id },
    DisplaySpec { label: "Name", get: get_name },
    DisplaySpec { label: "Minted?", get: get_minted },
    DisplaySpec { label: "Description", get: get_description },
    DisplaySpec { label: "Twitter", get: get_twitter },
    DisplaySpec { label: "Discord", get: get_discord },
    DisplaySpec { label: "Announcement", get: get_message_id },
    DisplaySpec { label: "Role", get: get_role_id },
    DisplaySpec { label: "Channel", get: get_channel_id },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_applies_and_reads_back_every_form_field() {
        let mut project = Project::default();
        let values = ["Alpha", "Y", "A test project", "@alpha", "discord.gg/alpha"];
        for (field, value) in FORM_FIELDS.iter().zip(values) {
            (field.apply)(&mut project, value);
        }
        assert_eq!(project.name, "Alpha");
        assert!(project.is_minted);
        for (field, value) in FORM_FIELDS.iter().zip(values) {
            assert_eq!((field.get)(&project), *value);
        }
    }

    #[test]
    fn minted_flag_accepts_either_case_and_defaults_off() {
        let mut project = Project::default();
        (FORM_FIELDS[1].apply)(&mut project, "y");
        assert!(project.is_minted);
        (FORM_FIELDS[1].apply)(&mut project, "n");
        assert!(!project.is_minted);
        (FORM_FIELDS[1].apply)(&mut project, "maybe");
        assert!(!project.is_minted);
    }

    #[test]
    fn unset_references_stringify_as_empty() {
        let project = Project { id: 3, name: "Alpha".into(), ..Default::default() };
        let by_label = |label: &str| {
            AUDIT_FIELDS
                .iter()
                .find(|f| f.label == label)
                .map(|f| (f.get)(&project))
                .unwrap()
        };
        assert_eq!(by_label("Id"), "3");
        assert_eq!(by_label("Announcement"), "");
        assert_eq!(by_label("Role"), "");
    }

    #[test]
    fn record_round_trips_through_json() {
        let project = Project {
            id: 2,
            name: "Beta".into(),
            description: "desc".into(),
            twitter: String::new(),
            discord: "discord.gg/beta".into(),
            is_minted: true,
            message_id: hive_discord::MessageId(111),
            role_id: hive_discord::RoleId(222),
            channel_id: hive_discord::ChannelId(333),
        };
        let json = serde_json::to_string(&project).unwrap();
        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(back, project);
    }
}
