//! Authenticated Discord REST client.
//!
//! One `Client` is shared across the whole bot; every method is a single
//! REST call with no retry. Rate-limit and permission rejections surface as
//! [`DiscordError::Api`] with Discord's own error message, which callers
//! forward to the user where the flow requires it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::component::ActionRow;
use crate::embed::Embed;
use crate::interaction::{InteractionResponse, EPHEMERAL};
use crate::types::{
    ApplicationId, Channel, ChannelId, GuildId, InteractionId, Member, Message, MessageId,
    PermissionOverwrite, Role, RoleId, UserId,
};

const API_BASE: &str = "https://discord.com/api/v10";

/// Discord REST client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    token: String,
    pub application_id: ApplicationId,
}

/// Outgoing message body, shared by create and edit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ActionRow>,
}

impl CreateMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Default::default() }
    }

    pub fn embed(embed: Embed) -> Self {
        Self { embeds: vec![embed], ..Default::default() }
    }

    pub fn with_components(mut self, components: Vec<ActionRow>) -> Self {
        self.components = components;
        self
    }
}

/// Follow-up message posted through an interaction's webhook.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FollowupMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl FollowupMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Default::default() }
    }

    pub fn embed(embed: Embed) -> Self {
        Self { embeds: vec![embed], ..Default::default() }
    }

    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(EPHEMERAL);
        self
    }
}

/// Guild slash-command definition for registration.
#[derive(Debug, Clone, Serialize)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOptionSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandOptionSpec {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<CommandChoice>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOptionSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandChoice {
    pub name: String,
    pub value: String,
}

impl CommandOptionSpec {
    pub fn subcommand(
        name: impl Into<String>,
        description: impl Into<String>,
        options: Vec<CommandOptionSpec>,
    ) -> Self {
        Self {
            kind: 1,
            name: name.into(),
            description: description.into(),
            required: false,
            choices: Vec::new(),
            options,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            kind: 3,
            name: name.into(),
            description: description.into(),
            required,
            choices: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn with_choices(mut self, choices: Vec<(&str, &str)>) -> Self {
        self.choices = choices
            .into_iter()
            .map(|(name, value)| CommandChoice { name: name.to_string(), value: value.to_string() })
            .collect();
        self
    }
}

impl Client {
    pub fn new(token: impl Into<String>, application_id: ApplicationId) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            application_id,
        }
    }

    async fn dispatch(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, DiscordError> {
        let mut request = self
            .http
            .request(method, format!("{API_BASE}{path}"))
            .header("Authorization", format!("Bot {}", self.token));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorBody>().await {
                Ok(err) => err.message,
                Err(_) => "no error body".to_string(),
            };
            tracing::debug!(%status, path, "Discord API rejection: {message}");
            return Err(DiscordError::Api { status: status.as_u16(), message });
        }
        Ok(response)
    }

    /// A call whose JSON response the caller wants.
    async fn fetch<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, DiscordError> {
        Ok(self.dispatch(method, path, body).await?.json().await?)
    }

    /// A call answered with 204 No Content.
    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), DiscordError> {
        self.dispatch(method, path, body).await.map(|_| ())
    }

    // ── Roles ──────────────────────────────────────────────────────────

    pub async fn create_role(&self, guild: GuildId, name: &str) -> Result<Role, DiscordError> {
        self.fetch(
            reqwest::Method::POST,
            &format!("/guilds/{guild}/roles"),
            Some(serde_json::json!({ "name": name })),
        )
        .await
    }

    pub async fn rename_role(
        &self,
        guild: GuildId,
        role: RoleId,
        name: &str,
    ) -> Result<(), DiscordError> {
        self.send(
            reqwest::Method::PATCH,
            &format!("/guilds/{guild}/roles/{role}"),
            Some(serde_json::json!({ "name": name })),
        )
        .await
    }

    pub async fn delete_role(&self, guild: GuildId, role: RoleId) -> Result<(), DiscordError> {
        self.send(reqwest::Method::DELETE, &format!("/guilds/{guild}/roles/{role}"), None)
            .await
    }

    // ── Channels ───────────────────────────────────────────────────────

    /// Create a text channel under a category. Overwrites are applied
    /// separately so their ordering is under the caller's control.
    pub async fn create_channel(
        &self,
        guild: GuildId,
        name: &str,
        parent: ChannelId,
    ) -> Result<Channel, DiscordError> {
        self.fetch(
            reqwest::Method::POST,
            &format!("/guilds/{guild}/channels"),
            Some(serde_json::json!({ "name": name, "type": 0, "parent_id": parent })),
        )
        .await
    }

    pub async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<(), DiscordError> {
        self.send(
            reqwest::Method::PATCH,
            &format!("/channels/{channel}"),
            Some(serde_json::json!({ "name": name })),
        )
        .await
    }

    pub async fn delete_channel(&self, channel: ChannelId) -> Result<(), DiscordError> {
        self.send(reqwest::Method::DELETE, &format!("/channels/{channel}"), None)
            .await
    }

    pub async fn edit_channel_permission(
        &self,
        channel: ChannelId,
        overwrite: &PermissionOverwrite,
    ) -> Result<(), DiscordError> {
        self.send(
            reqwest::Method::PUT,
            &format!("/channels/{channel}/permissions/{}", overwrite.id),
            Some(serde_json::to_value(overwrite)?),
        )
        .await
    }

    // ── Messages ───────────────────────────────────────────────────────

    pub async fn create_message(
        &self,
        channel: ChannelId,
        message: &CreateMessage,
    ) -> Result<Message, DiscordError> {
        self.fetch(
            reqwest::Method::POST,
            &format!("/channels/{channel}/messages"),
            Some(serde_json::to_value(message)?),
        )
        .await
    }

    pub async fn edit_message(
        &self,
        channel: ChannelId,
        message_id: MessageId,
        message: &CreateMessage,
    ) -> Result<Message, DiscordError> {
        self.fetch(
            reqwest::Method::PATCH,
            &format!("/channels/{channel}/messages/{message_id}"),
            Some(serde_json::to_value(message)?),
        )
        .await
    }

    pub async fn delete_message(
        &self,
        channel: ChannelId,
        message_id: MessageId,
    ) -> Result<(), DiscordError> {
        self.send(
            reqwest::Method::DELETE,
            &format!("/channels/{channel}/messages/{message_id}"),
            None,
        )
        .await
    }

    // ── Members ────────────────────────────────────────────────────────

    pub async fn get_member(&self, guild: GuildId, user: UserId) -> Result<Member, DiscordError> {
        self.fetch(reqwest::Method::GET, &format!("/guilds/{guild}/members/{user}"), None)
            .await
    }

    pub async fn add_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), DiscordError> {
        self.send(
            reqwest::Method::PUT,
            &format!("/guilds/{guild}/members/{user}/roles/{role}"),
            None,
        )
        .await
    }

    pub async fn remove_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), DiscordError> {
        self.send(
            reqwest::Method::DELETE,
            &format!("/guilds/{guild}/members/{user}/roles/{role}"),
            None,
        )
        .await
    }

    // ── Commands and interactions ──────────────────────────────────────

    /// Bulk-overwrite the guild's slash commands with the given set.
    pub async fn register_guild_commands(
        &self,
        guild: GuildId,
        commands: &[CommandSpec],
    ) -> Result<(), DiscordError> {
        self.send(
            reqwest::Method::PUT,
            &format!("/applications/{}/guilds/{guild}/commands", self.application_id),
            Some(serde_json::to_value(commands)?),
        )
        .await
    }

    /// Answer an interaction within its 3-second callback window.
    pub async fn interaction_callback(
        &self,
        interaction: InteractionId,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), DiscordError> {
        self.send(
            reqwest::Method::POST,
            &format!("/interactions/{interaction}/{token}/callback"),
            Some(serde_json::to_value(response)?),
        )
        .await
    }

    /// Post a follow-up through the interaction webhook.
    pub async fn create_followup(
        &self,
        token: &str,
        message: &FollowupMessage,
    ) -> Result<Message, DiscordError> {
        self.fetch(
            reqwest::Method::POST,
            &format!("/webhooks/{}/{token}", self.application_id),
            Some(serde_json::to_value(message)?),
        )
        .await
    }

    pub async fn delete_followup(
        &self,
        token: &str,
        message_id: MessageId,
    ) -> Result<(), DiscordError> {
        self.send(
            reqwest::Method::DELETE,
            &format!("/webhooks/{}/{token}/messages/{message_id}", self.application_id),
            None,
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Discord rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ActionRow, Button, ButtonStyle};

    #[test]
    fn command_spec_serializes_subcommands_and_choices() {
        let spec = CommandSpec {
            name: "project".to_string(),
            description: "Manage community projects".to_string(),
            options: vec![
                CommandOptionSpec::subcommand("add", "Add a project", vec![]),
                CommandOptionSpec::subcommand(
                    "list",
                    "List projects",
                    vec![CommandOptionSpec::string("filter", "Which projects", true)
                        .with_choices(vec![("All", "all"), ("Not yet minted", "unminted")])],
                ),
            ],
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["options"][0]["type"], 1);
        assert!(json["options"][0].get("required").is_none());
        assert_eq!(json["options"][1]["options"][0]["choices"][1]["value"], "unminted");
    }

    #[test]
    fn create_message_omits_empty_parts() {
        let body = CreateMessage::text("hello");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["content"], "hello");
        assert!(json.get("embeds").is_none());

        let body = CreateMessage::embed(Embed::new().with_title("t")).with_components(vec![
            ActionRow::buttons(vec![Button::new(ButtonStyle::Primary, "Role", "project-role")]),
        ]);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["components"][0]["type"], 1);
    }
}
