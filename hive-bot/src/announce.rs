//! The published announcement representing a project.
//!
//! `render` is a pure function from a project to embed + button row; the
//! `Announcer` port does the actual publishing against the fixed
//! announcement channel.

use async_trait::async_trait;
use chrono::Utc;

use hive_discord::client::CreateMessage;
use hive_discord::component::{ActionRow, Button, ButtonStyle};
use hive_discord::embed::{color, Embed};
use hive_discord::types::{ChannelId, Message, MessageId};
use hive_discord::Client;

use crate::project::Project;

/// Custom ids of the three controls attached to every announcement.
pub mod buttons {
    pub const ROLE: &str = "project-role";
    pub const EDIT: &str = "project-edit";
    pub const DELETE: &str = "project-delete";
}

#[derive(Debug, thiserror::Error)]
#[error("announcement delivery failed: {0}")]
pub struct AnnounceError(pub String);

/// Render a project to its announcement content: embed plus control row.
///
/// Unfilled link fields are left out entirely; the "Not filled in"
/// placeholder belongs to the audit log, not the announcement.
pub fn render(project: &Project) -> (Embed, Vec<ActionRow>) {
    let mut embed = Embed::new()
        .with_title(&project.name)
        .with_color(color::BLUE)
        .with_timestamp(Utc::now().to_rfc3339())
        .with_footer(project.id.to_string())
        .field("Minted?", if project.is_minted { "Yes" } else { "No" }, false);

    if !project.description.is_empty() {
        embed.description = Some(project.description.clone());
    }
    if !project.twitter.is_empty() {
        embed = embed.field("Twitter", &project.twitter, true);
    }
    if !project.discord.is_empty() {
        embed = embed.field("Discord", &project.discord, true);
    }

    let controls = ActionRow::buttons(vec![
        Button::new(ButtonStyle::Primary, "Role", buttons::ROLE).with_emoji("✨"),
        Button::new(ButtonStyle::Secondary, "Edit", buttons::EDIT),
        Button::new(ButtonStyle::Danger, "Delete", buttons::DELETE),
    ]);

    (embed, vec![controls])
}

/// Read the project id back out of an announcement's footer. The footer is
/// the only link from a rendered message to its record.
pub fn footer_project_id(message: &Message) -> Option<u32> {
    message
        .embeds
        .first()
        .and_then(|embed| embed.footer.as_ref())
        .and_then(|footer| footer.text.parse().ok())
}

/// Publishes and maintains announcement messages.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn publish(&self, embed: Embed, rows: Vec<ActionRow>)
        -> Result<MessageId, AnnounceError>;
    async fn update(
        &self,
        message: MessageId,
        embed: Embed,
        rows: Vec<ActionRow>,
    ) -> Result<(), AnnounceError>;
    async fn delete(&self, message: MessageId) -> Result<(), AnnounceError>;
}

/// Announcer over the Discord message API, bound to the announce channel.
pub struct DiscordAnnouncer {
    client: Client,
    channel: ChannelId,
}

impl DiscordAnnouncer {
    pub fn new(client: Client, channel: ChannelId) -> Self {
        Self { client, channel }
    }
}

#[async_trait]
impl Announcer for DiscordAnnouncer {
    async fn publish(
        &self,
        embed: Embed,
        rows: Vec<ActionRow>,
    ) -> Result<MessageId, AnnounceError> {
        let message = self
            .client
            .create_message(self.channel, &CreateMessage::embed(embed).with_components(rows))
            .await
            .map_err(|e| AnnounceError(e.to_string()))?;
        Ok(message.id)
    }

    async fn update(
        &self,
        message: MessageId,
        embed: Embed,
        rows: Vec<ActionRow>,
    ) -> Result<(), AnnounceError> {
        self.client
            .edit_message(
                self.channel,
                message,
                &CreateMessage::embed(embed).with_components(rows),
            )
            .await
            .map(|_| ())
            .map_err(|e| AnnounceError(e.to_string()))
    }

    async fn delete(&self, message: MessageId) -> Result<(), AnnounceError> {
        self.client
            .delete_message(self.channel, message)
            .await
            .map_err(|e| AnnounceError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_discord::embed::EmbedFooter;

    fn project() -> Project {
        Project { id: 7, name: "Alpha".into(), ..Default::default() }
    }

    #[test]
    fn unfilled_links_are_omitted_entirely() {
        let (embed, _) = render(&project());
        assert_eq!(embed.title.as_deref(), Some("Alpha"));
        assert_eq!(embed.fields.len(), 1);
        assert_eq!(embed.fields[0].name, "Minted?");
        assert_eq!(embed.fields[0].value, "No");
        assert!(embed.description.is_none());
    }

    #[test]
    fn filled_links_become_inline_fields() {
        let mut p = project();
        p.twitter = "@alpha".to_string();
        p.discord = "discord.gg/alpha".to_string();
        p.is_minted = true;
        let (embed, rows) = render(&p);
        let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Minted?", "Twitter", "Discord"]);
        assert_eq!(embed.fields[0].value, "Yes");
        assert!(embed.fields[1].inline);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn footer_round_trips_to_the_project_id() {
        let (embed, _) = render(&project());
        assert_eq!(embed.footer.as_ref().unwrap().text, "7");

        let message = Message {
            id: MessageId(1),
            channel_id: ChannelId(2),
            embeds: vec![embed],
        };
        assert_eq!(footer_project_id(&message), Some(7));
    }

    #[test]
    fn missing_or_malformed_footers_do_not_resolve() {
        let mut message = Message { id: MessageId(1), channel_id: ChannelId(2), embeds: vec![] };
        assert_eq!(footer_project_id(&message), None);

        message.embeds = vec![Embed {
            footer: Some(EmbedFooter { text: "not-a-number".into() }),
            ..Default::default()
        }];
        assert_eq!(footer_project_id(&message), None);
    }
}
