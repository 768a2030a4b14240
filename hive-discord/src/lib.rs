//! hive-discord: a minimal typed Discord REST client.
//!
//! Covers exactly the surface the hive bot needs: roles, channels with
//! permission overwrites, messages with embeds and button components,
//! guild-member role assignment, slash-command registration, and the
//! interactions webhook contract (payload model, response envelope,
//! request-signature verification).

pub mod client;
pub mod component;
pub mod embed;
pub mod interaction;
pub mod types;
pub mod verify;

pub use client::{Client, DiscordError};
pub use embed::Embed;
pub use interaction::{Interaction, InteractionResponse};
pub use types::{ChannelId, GuildId, MessageId, RoleId, UserId};
