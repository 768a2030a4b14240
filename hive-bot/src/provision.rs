//! Provisioning of the external resources backing a project: the access
//! group (a guild role) and the restricted discussion channel.

use async_trait::async_trait;

use hive_discord::types::{permissions, ChannelId, GuildId, PermissionOverwrite, RoleId, UserId};
use hive_discord::Client;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("group provisioning failed: {0}")]
    Group(String),
    #[error("channel provisioning failed: {0}")]
    Channel(String),
    #[error("membership change failed: {0}")]
    Membership(String),
}

/// Which way a membership toggle went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Granted,
    Removed,
}

/// Creates, renames and deletes the platform resources backing a project.
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn create_group(&self, name: &str) -> Result<RoleId, ProvisionError>;

    /// Create the project channel and apply the restricted-visibility
    /// permission template. Callers must already hold a group id.
    async fn create_restricted_channel(
        &self,
        name: &str,
        group: RoleId,
    ) -> Result<ChannelId, ProvisionError>;

    async fn rename_group(&self, group: RoleId, name: &str) -> Result<(), ProvisionError>;
    async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<(), ProvisionError>;
    async fn delete_group(&self, group: RoleId) -> Result<(), ProvisionError>;
    async fn delete_channel(&self, channel: ChannelId) -> Result<(), ProvisionError>;

    /// Grant the group if the user lacks it, remove it if they hold it.
    async fn toggle_membership(
        &self,
        user: UserId,
        group: RoleId,
    ) -> Result<MembershipChange, ProvisionError>;
}

/// The restricted-channel overwrites, in application order. The bot's own
/// override must land before the deny-all so there is no window where the
/// bot has locked itself out of the channel it is configuring.
pub fn permission_template(
    bot_role: RoleId,
    everyone: RoleId,
    group: RoleId,
) -> Vec<PermissionOverwrite> {
    vec![
        PermissionOverwrite::role(
            bot_role,
            permissions::VIEW_CHANNEL | permissions::MANAGE_CHANNELS | permissions::MANAGE_ROLES,
            0,
        ),
        PermissionOverwrite::role(everyone, 0, permissions::ALL),
        PermissionOverwrite::role(
            group,
            permissions::VIEW_CHANNEL
                | permissions::SEND_MESSAGES
                | permissions::ADD_REACTIONS
                | permissions::READ_MESSAGE_HISTORY,
            0,
        ),
    ]
}

/// Provisioner over the Discord REST API.
pub struct DiscordProvisioner {
    client: Client,
    guild: GuildId,
    /// Category the project channels are created under.
    category: ChannelId,
    /// The bot's own service role.
    bot_role: RoleId,
}

impl DiscordProvisioner {
    pub fn new(client: Client, guild: GuildId, category: ChannelId, bot_role: RoleId) -> Self {
        Self { client, guild, category, bot_role }
    }

    /// The `@everyone` role id is defined to equal the guild id.
    fn everyone(&self) -> RoleId {
        RoleId(self.guild.0)
    }
}

#[async_trait]
impl Provisioner for DiscordProvisioner {
    async fn create_group(&self, name: &str) -> Result<RoleId, ProvisionError> {
        let role = self
            .client
            .create_role(self.guild, name)
            .await
            .map_err(|e| ProvisionError::Group(e.to_string()))?;
        tracing::info!(role = %role.id, name, "Created project group");
        Ok(role.id)
    }

    async fn create_restricted_channel(
        &self,
        name: &str,
        group: RoleId,
    ) -> Result<ChannelId, ProvisionError> {
        let channel = self
            .client
            .create_channel(self.guild, name, self.category)
            .await
            .map_err(|e| ProvisionError::Channel(e.to_string()))?;

        for overwrite in permission_template(self.bot_role, self.everyone(), group) {
            self.client
                .edit_channel_permission(channel.id, &overwrite)
                .await
                .map_err(|e| ProvisionError::Channel(e.to_string()))?;
        }

        tracing::info!(channel = %channel.id, name, "Created restricted channel");
        Ok(channel.id)
    }

    async fn rename_group(&self, group: RoleId, name: &str) -> Result<(), ProvisionError> {
        self.client
            .rename_role(self.guild, group, name)
            .await
            .map_err(|e| ProvisionError::Group(e.to_string()))
    }

    async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<(), ProvisionError> {
        self.client
            .rename_channel(channel, name)
            .await
            .map_err(|e| ProvisionError::Channel(e.to_string()))
    }

    async fn delete_group(&self, group: RoleId) -> Result<(), ProvisionError> {
        self.client
            .delete_role(self.guild, group)
            .await
            .map_err(|e| ProvisionError::Group(e.to_string()))
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), ProvisionError> {
        self.client
            .delete_channel(channel)
            .await
            .map_err(|e| ProvisionError::Channel(e.to_string()))
    }

    async fn toggle_membership(
        &self,
        user: UserId,
        group: RoleId,
    ) -> Result<MembershipChange, ProvisionError> {
        let member = self
            .client
            .get_member(self.guild, user)
            .await
            .map_err(|e| ProvisionError::Membership(e.to_string()))?;

        if member.roles.contains(&group) {
            self.client
                .remove_member_role(self.guild, user, group)
                .await
                .map_err(|e| ProvisionError::Membership(e.to_string()))?;
            Ok(MembershipChange::Removed)
        } else {
            self.client
                .add_member_role(self.guild, user, group)
                .await
                .map_err(|e| ProvisionError::Membership(e.to_string()))?;
            Ok(MembershipChange::Granted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_applies_bot_override_before_the_deny_all() {
        let bot = RoleId(10);
        let everyone = RoleId(1);
        let group = RoleId(20);
        let template = permission_template(bot, everyone, group);

        assert_eq!(template.len(), 3);
        assert_eq!(template[0].id, bot);
        assert!(template[0].allow & permissions::MANAGE_CHANNELS != 0);
        assert_eq!(template[1].id, everyone);
        assert_eq!(template[1].deny, permissions::ALL);
        assert_eq!(template[2].id, group);
        assert!(template[2].allow & permissions::SEND_MESSAGES != 0);
        assert_eq!(template[2].deny, 0);
    }
}
