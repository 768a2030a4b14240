//! hive-bot entry point: wire the collaborators and serve the interactions
//! endpoint.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hive_bot::announce::DiscordAnnouncer;
use hive_bot::audit::{AuditLog, DiscordAuditSink};
use hive_bot::config::Settings;
use hive_bot::orchestrator::{GuildContext, Orchestrator};
use hive_bot::provision::DiscordProvisioner;
use hive_bot::store::{FileStore, ProjectStore};
use hive_bot::web::{self, AppState};
use hive_discord::client::{CommandOptionSpec, CommandSpec};
use hive_discord::verify::InteractionVerifier;
use hive_discord::Client;

#[tokio::main]
async fn main() -> Result<()> {
    // Use JSON logs in production (HIVE_LOG_JSON=1), human-readable otherwise
    let json_logs = std::env::var("HIVE_LOG_JSON").unwrap_or_default() == "1";
    let filter = EnvFilter::from_default_env().add_directive("hive_bot=info".parse()?);
    if json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let settings = Settings::parse();
    let verifier = InteractionVerifier::from_hex(&settings.public_key)?;
    let client = Client::new(&settings.discord_token, settings.application_id);

    // Command registration is idempotent; a failure is survivable because
    // the previously registered set keeps working.
    if let Err(e) = client.register_guild_commands(settings.guild_id, &project_commands()).await {
        tracing::warn!(error = %e, "Slash command registration failed");
    }

    let store =
        Arc::new(ProjectStore::open(Box::new(FileStore::new(&settings.store_path))).await);
    let provisioner = Arc::new(DiscordProvisioner::new(
        client.clone(),
        settings.guild_id,
        settings.project_category_id,
        settings.bot_role_id,
    ));
    let announcer = Arc::new(DiscordAnnouncer::new(client.clone(), settings.announce_channel_id));
    let audit =
        AuditLog::new(Arc::new(DiscordAuditSink::new(client.clone(), settings.audit_channel_id)));
    let context = GuildContext {
        guild: settings.guild_id,
        announce_channel: settings.announce_channel_id,
        admin_role: settings.admin_role_id,
    };

    let orchestrator = Arc::new(Orchestrator::new(
        store,
        provisioner,
        announcer,
        Arc::new(client),
        audit,
        context,
    ));
    let state = Arc::new(AppState { orchestrator, verifier });

    tracing::info!(addr = %settings.listen_addr, "Serving interactions endpoint");
    let listener = tokio::net::TcpListener::bind(&settings.listen_addr).await?;
    axum::serve(listener, web::router(state)).await?;
    Ok(())
}

/// The guild command set: `/project add`, `/project list`.
fn project_commands() -> Vec<CommandSpec> {
    vec![CommandSpec {
        name: "project".to_string(),
        description: "Manage community projects".to_string(),
        options: vec![
            CommandOptionSpec::subcommand("add", "Add a project to the bot!", vec![]),
            CommandOptionSpec::subcommand(
                "list",
                "Get the list of registered projects",
                vec![
                    CommandOptionSpec::string("filter", "Which projects to list", true)
                        .with_choices(vec![("All", "all"), ("Not yet minted", "unminted")]),
                ],
            ),
        ],
    }]
}
