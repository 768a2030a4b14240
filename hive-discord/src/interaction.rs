//! Interaction payloads and response envelopes.
//!
//! Discord delivers every user action (slash command, button press, modal
//! submission) as one POST to the interactions endpoint. The payload model
//! here is the subset the bot consumes; the response envelope covers the
//! five callback types it produces.

use serde::{Deserialize, Serialize};

use crate::component::ActionRow;
use crate::embed::Embed;
use crate::types::{ApplicationId, ChannelId, GuildId, InteractionId, Member, Message, User};

/// Incoming interaction types.
pub mod kind {
    pub const PING: u8 = 1;
    pub const APPLICATION_COMMAND: u8 = 2;
    pub const MESSAGE_COMPONENT: u8 = 3;
    pub const MODAL_SUBMIT: u8 = 5;
}

/// Message flag marking a reply visible only to the invoking user.
pub const EPHEMERAL: u64 = 1 << 6;

/// An incoming interaction.
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub application_id: ApplicationId,
    #[serde(rename = "type")]
    pub kind: u8,
    /// Continuation token for follow-up webhooks, valid 15 minutes.
    pub token: String,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    /// Present when the interaction happened in a guild.
    #[serde(default)]
    pub member: Option<Member>,
    /// Present instead of `member` outside a guild.
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub data: Option<InteractionData>,
    /// For component interactions, the message the component is attached to.
    #[serde(default)]
    pub message: Option<Message>,
}

impl Interaction {
    /// The acting user, from whichever envelope Discord delivered.
    pub fn actor(&self) -> Option<&User> {
        self.member.as_ref().map(|m| &m.user).or(self.user.as_ref())
    }
}

/// Type-dependent interaction data: command name and options, component
/// custom id, or submitted modal rows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub components: Vec<SubmittedRow>,
}

/// A command option. Subcommands nest their own options one level down.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

/// A submitted modal action row.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedRow {
    #[serde(default)]
    pub components: Vec<SubmittedInput>,
}

/// One submitted text input.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedInput {
    pub custom_id: String,
    #[serde(default)]
    pub value: String,
}

impl InteractionData {
    /// Look up a submitted text-input value by its custom id.
    pub fn input(&self, custom_id: &str) -> Option<&str> {
        self.components
            .iter()
            .flat_map(|row| row.components.iter())
            .find(|input| input.custom_id == custom_id)
            .map(|input| input.value.as_str())
    }
}

// ── Responses ──────────────────────────────────────────────────────────

mod response_kind {
    pub const PONG: u8 = 1;
    pub const MESSAGE: u8 = 4;
    pub const DEFERRED_MESSAGE: u8 = 5;
    pub const DEFERRED_UPDATE: u8 = 6;
    pub const MODAL: u8 = 9;
}

/// The body returned from the interactions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<ResponseData>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<ActionRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

fn ephemeral_flags(ephemeral: bool) -> Option<u64> {
    ephemeral.then_some(EPHEMERAL)
}

impl InteractionResponse {
    /// Answer to a `PING` liveness check.
    pub fn pong() -> Self {
        Self { kind: response_kind::PONG, data: None }
    }

    /// An immediate text reply.
    pub fn message(content: impl Into<String>, ephemeral: bool) -> Self {
        Self {
            kind: response_kind::MESSAGE,
            data: Some(ResponseData {
                content: Some(content.into()),
                flags: ephemeral_flags(ephemeral),
                ..Default::default()
            }),
        }
    }

    /// An immediate text reply carrying components (confirmation prompts).
    pub fn message_with_components(
        content: impl Into<String>,
        components: Vec<ActionRow>,
        ephemeral: bool,
    ) -> Self {
        Self {
            kind: response_kind::MESSAGE,
            data: Some(ResponseData {
                content: Some(content.into()),
                components,
                flags: ephemeral_flags(ephemeral),
                ..Default::default()
            }),
        }
    }

    /// Acknowledge now, deliver the real reply later as a follow-up.
    pub fn deferred(ephemeral: bool) -> Self {
        Self {
            kind: response_kind::DEFERRED_MESSAGE,
            data: Some(ResponseData {
                flags: ephemeral_flags(ephemeral),
                ..Default::default()
            }),
        }
    }

    /// Acknowledge a component press without changing anything visible.
    pub fn deferred_update() -> Self {
        Self { kind: response_kind::DEFERRED_UPDATE, data: None }
    }

    /// Open a modal form.
    pub fn modal(
        custom_id: impl Into<String>,
        title: impl Into<String>,
        rows: Vec<ActionRow>,
    ) -> Self {
        Self {
            kind: response_kind::MODAL,
            data: Some(ResponseData {
                custom_id: Some(custom_id.into()),
                title: Some(title.into()),
                components: rows,
                ..Default::default()
            }),
        }
    }
}
