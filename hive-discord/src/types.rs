//! Core Discord wire types: snowflake ids, roles, channels, members,
//! permission overwrites.
//!
//! Discord serializes snowflakes as decimal strings to survive JSON number
//! precision limits; the id newtypes here follow that on the wire while
//! staying `u64` in memory.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::embed::Embed;

macro_rules! snowflake_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map($name)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

snowflake_id!(
    /// A guild (server) id.
    GuildId
);
snowflake_id!(
    /// A channel id.
    ChannelId
);
snowflake_id!(
    /// A message id.
    MessageId
);
snowflake_id!(
    /// A role id.
    RoleId
);
snowflake_id!(
    /// A user id.
    UserId
);
snowflake_id!(
    /// An application (bot) id.
    ApplicationId
);
snowflake_id!(
    /// An interaction id, used once for the callback URL.
    InteractionId
);

/// Permission bits used by the restricted-channel template.
pub mod permissions {
    pub const MANAGE_CHANNELS: u64 = 1 << 4;
    pub const ADD_REACTIONS: u64 = 1 << 6;
    pub const VIEW_CHANNEL: u64 = 1 << 10;
    pub const SEND_MESSAGES: u64 = 1 << 11;
    pub const READ_MESSAGE_HISTORY: u64 = 1 << 16;
    pub const MANAGE_ROLES: u64 = 1 << 28;

    /// Every bit this bot ever grants, used for the deny-all overwrite.
    pub const ALL: u64 = MANAGE_CHANNELS
        | ADD_REACTIONS
        | VIEW_CHANNEL
        | SEND_MESSAGES
        | READ_MESSAGE_HISTORY
        | MANAGE_ROLES;
}

/// Permission bitfields travel as decimal strings, same as snowflakes.
mod u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A role-targeted permission overwrite on a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    pub id: RoleId,
    /// 0 = role, 1 = member. This bot only writes role overwrites.
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(with = "u64_string")]
    pub allow: u64,
    #[serde(with = "u64_string")]
    pub deny: u64,
}

impl PermissionOverwrite {
    /// An overwrite targeting a role.
    pub fn role(id: RoleId, allow: u64, deny: u64) -> Self {
        Self { id, kind: 0, allow, deny }
    }
}

/// A guild role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

/// A guild channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<ChannelId>,
}

/// A Discord user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}

/// A guild member: the user plus the roles they hold in the guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

/// A channel message, as returned by the message endpoints and attached to
/// component interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub embeds: Vec<Embed>,
}

/// Jump URL for a guild message, as used in `[Details](…)` links.
pub fn message_url(guild: GuildId, channel: ChannelId, message: MessageId) -> String {
    format!("https://discord.com/channels/{guild}/{channel}/{message}")
}
