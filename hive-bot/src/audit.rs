//! Field-level diffing and the audit trail.
//!
//! Every create, edit and delete emits one embed to the audit channel.
//! Emission is fire-and-forget with its own error boundary: a failed
//! delivery is logged and dropped, never propagated into the flow that
//! triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use hive_discord::client::CreateMessage;
use hive_discord::embed::{color, Embed};
use hive_discord::types::ChannelId;
use hive_discord::Client;

use crate::project::{Project, AUDIT_FIELDS};

/// Placeholder for empty values in audit embeds.
const NOT_FILLED_IN: &str = "Not filled in";

/// Zero-width space, used as a spacer row between change pairs.
const SPACER: &str = "\u{200b}";

/// One changed field: its label and both stringified values.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub label: &'static str,
    pub old: String,
    pub new: String,
}

/// Compare two snapshots field by field. A field participates only when its
/// stringified values differ.
pub fn diff(old: &Project, new: &Project) -> Vec<FieldChange> {
    AUDIT_FIELDS
        .iter()
        .filter_map(|field| {
            let old_value = (field.get)(old);
            let new_value = (field.get)(new);
            (old_value != new_value).then(|| FieldChange {
                label: field.label,
                old: old_value,
                new: new_value,
            })
        })
        .collect()
}

fn display(value: &str) -> &str {
    if value.is_empty() { NOT_FILLED_IN } else { value }
}

/// Audit embed for a created project: every field, current values.
pub fn created_embed(actor: &str, project: &Project) -> Embed {
    full_record_embed(
        "PROJECT ADDED",
        format!("A project has been added by {actor} with the following details"),
        color::BLUE,
        project,
    )
}

/// Audit embed for a deleted project: every field, last values.
pub fn deleted_embed(actor: &str, project: &Project) -> Embed {
    full_record_embed(
        "PROJECT DELETION",
        format!("A project has been deleted by {actor} with the following details"),
        color::RED,
        project,
    )
}

fn full_record_embed(title: &str, description: String, accent: u32, project: &Project) -> Embed {
    let mut embed = Embed::new()
        .with_title(title)
        .with_description(description)
        .with_color(accent)
        .with_timestamp(Utc::now().to_rfc3339());
    for field in AUDIT_FIELDS {
        embed = embed.field(field.label, display(&(field.get)(project)), false);
    }
    embed
}

/// Audit embed for an edit: a previous/new pair per changed field, `None`
/// when nothing changed (no message is emitted then).
pub fn edited_embed(actor: &str, changes: &[FieldChange]) -> Option<Embed> {
    if changes.is_empty() {
        return None;
    }
    let mut embed = Embed::new()
        .with_title("PROJECT EDITED")
        .with_description(format!("A project has been edited by {actor} with the following changes"))
        .with_color(color::ORANGE)
        .with_timestamp(Utc::now().to_rfc3339());
    for change in changes {
        embed = embed
            .field(SPACER, SPACER, false)
            .field(format!("{}: previous value", change.label), display(&change.old), true)
            .field(format!("{}: new value", change.label), display(&change.new), true);
    }
    Some(embed)
}

/// Delivery target for audit embeds.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn send(&self, embed: Embed) -> anyhow::Result<()>;
}

/// Sink posting to the configured audit channel.
pub struct DiscordAuditSink {
    client: Client,
    channel: ChannelId,
}

impl DiscordAuditSink {
    pub fn new(client: Client, channel: ChannelId) -> Self {
        Self { client, channel }
    }
}

#[async_trait]
impl AuditSink for DiscordAuditSink {
    async fn send(&self, embed: Embed) -> anyhow::Result<()> {
        self.client.create_message(self.channel, &CreateMessage::embed(embed)).await?;
        Ok(())
    }
}

/// The audit log handle flows hold.
#[derive(Clone)]
pub struct AuditLog {
    sink: Arc<dyn AuditSink>,
}

impl AuditLog {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn created(&self, actor: &str, project: &Project) {
        self.dispatch(created_embed(actor, project));
    }

    pub fn deleted(&self, actor: &str, project: &Project) {
        self.dispatch(deleted_embed(actor, project));
    }

    pub fn edited(&self, actor: &str, new: &Project, old: &Project) {
        if let Some(embed) = edited_embed(actor, &diff(old, new)) {
            self.dispatch(embed);
        }
    }

    /// Best-effort asynchronous delivery. The spawned task owns the error:
    /// a failed send is logged locally and dropped.
    fn dispatch(&self, embed: Embed) {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.send(embed).await {
                tracing::warn!(error = %e, "Audit message delivery failed, dropping");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Project {
        Project {
            id: 1,
            name: "Alpha".into(),
            description: "first".into(),
            ..Default::default()
        }
    }

    #[test]
    fn identical_snapshots_produce_no_changes_and_no_embed() {
        let project = base();
        let changes = diff(&project, &project.clone());
        assert!(changes.is_empty());
        assert!(edited_embed("queen", &changes).is_none());
    }

    #[test]
    fn exactly_the_differing_fields_are_paired() {
        let old = base();
        let mut new = old.clone();
        new.name = "Alpha2".to_string();
        new.is_minted = true;
        new.twitter = "@alpha".to_string();

        let changes = diff(&old, &new);
        let labels: Vec<&str> = changes.iter().map(|c| c.label).collect();
        assert_eq!(labels, ["Name", "Minted?", "Twitter"]);
        assert_eq!(changes[0].old, "Alpha");
        assert_eq!(changes[0].new, "Alpha2");
        assert_eq!(changes[1].old, "N");
        assert_eq!(changes[1].new, "Y");

        // One spacer plus a previous/new pair per change.
        let embed = edited_embed("queen", &changes).unwrap();
        assert_eq!(embed.fields.len(), changes.len() * 3);
        assert_eq!(embed.fields[1].name, "Name: previous value");
        assert_eq!(embed.fields[2].name, "Name: new value");
        assert!(embed.fields[1].inline);
    }

    #[test]
    fn empty_values_render_as_the_placeholder() {
        let old = base();
        let mut new = old.clone();
        new.twitter = "@alpha".to_string();

        let embed = edited_embed("queen", &diff(&old, &new)).unwrap();
        assert_eq!(embed.fields[1].value, "Not filled in");
        assert_eq!(embed.fields[2].value, "@alpha");
    }

    #[test]
    fn create_embed_enumerates_every_field() {
        let embed = created_embed("queen", &base());
        assert_eq!(embed.fields.len(), AUDIT_FIELDS.len());
        assert_eq!(embed.title.as_deref(), Some("PROJECT ADDED"));
        assert_eq!(embed.color, Some(color::BLUE));

        // Unset references show the placeholder, not a zero.
        let announcement = embed.fields.iter().find(|f| f.name == "Announcement").unwrap();
        assert_eq!(announcement.value, "Not filled in");
    }

    #[test]
    fn delete_embed_uses_the_red_accent() {
        let embed = deleted_embed("queen", &base());
        assert_eq!(embed.title.as_deref(), Some("PROJECT DELETION"));
        assert_eq!(embed.color, Some(color::RED));
    }
}
