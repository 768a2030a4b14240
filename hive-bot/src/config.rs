//! Bot configuration, parsed from flags with environment fallbacks; the
//! container deployment provides everything through the environment.

use std::path::PathBuf;

use clap::Parser;

use hive_discord::types::{ApplicationId, ChannelId, GuildId, RoleId};

#[derive(Debug, Clone, Parser)]
#[command(name = "hive-bot", about = "Community project bot")]
pub struct Settings {
    /// Bot token.
    #[arg(long, env = "HIVE_DISCORD_TOKEN", hide_env_values = true)]
    pub discord_token: String,

    /// Application public key (hex), for interaction signature checks.
    #[arg(long, env = "HIVE_PUBLIC_KEY")]
    pub public_key: String,

    /// Application id.
    #[arg(long, env = "HIVE_APPLICATION_ID")]
    pub application_id: ApplicationId,

    /// Guild the bot manages.
    #[arg(long, env = "HIVE_GUILD_ID")]
    pub guild_id: GuildId,

    /// Channel project announcements are published to.
    #[arg(long, env = "HIVE_ANNOUNCE_CHANNEL_ID")]
    pub announce_channel_id: ChannelId,

    /// Channel audit embeds are delivered to.
    #[arg(long, env = "HIVE_AUDIT_CHANNEL_ID")]
    pub audit_channel_id: ChannelId,

    /// Category project channels are created under.
    #[arg(long, env = "HIVE_PROJECT_CATEGORY_ID")]
    pub project_category_id: ChannelId,

    /// The bot's own service role.
    #[arg(long, env = "HIVE_BOT_ROLE_ID")]
    pub bot_role_id: RoleId,

    /// Role allowed to delete projects.
    #[arg(long, env = "HIVE_ADMIN_ROLE_ID")]
    pub admin_role_id: RoleId,

    /// Project registry file.
    #[arg(long, env = "HIVE_STORE_PATH", default_value = "projects.json")]
    pub store_path: PathBuf,

    /// HTTP listen address.
    #[arg(long, env = "HIVE_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_typed_ids_from_flags() {
        let settings = Settings::try_parse_from([
            "hive-bot",
            "--discord-token", "token",
            "--public-key", "ab",
            "--application-id", "1",
            "--guild-id", "2",
            "--announce-channel-id", "3",
            "--audit-channel-id", "4",
            "--project-category-id", "5",
            "--bot-role-id", "6",
            "--admin-role-id", "7",
        ])
        .unwrap();
        assert_eq!(settings.guild_id, GuildId(2));
        assert_eq!(settings.admin_role_id, RoleId(7));
        assert_eq!(settings.store_path, PathBuf::from("projects.json"));
        assert_eq!(settings.listen_addr, "0.0.0.0:8080");
    }
}
