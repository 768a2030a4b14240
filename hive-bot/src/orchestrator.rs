//! The lifecycle orchestrator: turns normalized interactions into the four
//! project flows (Create, Edit, Assign-Role, Delete-with-confirmation) plus
//! the project listing.
//!
//! Each interaction is handled on its own task. The inline response goes
//! back within the callback window; anything involving external calls runs
//! in a spawned continuation that talks through webhook follow-ups. All
//! collaborators arrive through the constructor, so the flows run unchanged
//! against test doubles.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex};

use hive_discord::client::FollowupMessage;
use hive_discord::component::{ActionRow, Button, ButtonStyle};
use hive_discord::embed::Embed;
use hive_discord::interaction::{kind, Interaction, InteractionData, InteractionResponse};
use hive_discord::types::{message_url, ChannelId, GuildId, MessageId, RoleId, User, UserId};
use hive_discord::Client;

use crate::announce::{buttons, footer_project_id, render, Announcer};
use crate::audit::AuditLog;
use crate::forms;
use crate::project::Project;
use crate::provision::Provisioner;
use crate::store::{ProjectStore, StoreError};

const CONFIRM_PREFIX: &str = "project-confirm:";
const CANCEL_PREFIX: &str = "project-cancel:";

/// How long a delete confirmation stays open.
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(10);
/// Lifetimes of the transient ephemeral acknowledgements.
const SUCCESS_ACK_TTL: Duration = Duration::from_secs(5);
const FAILURE_ACK_TTL: Duration = Duration::from_secs(10);

/// The announcement's footer id did not resolve to a live record.
#[derive(Debug, thiserror::Error)]
#[error("no registered project matches this announcement")]
pub struct ProjectNotFound;

/// Follow-up side of an interaction, behind a trait so flows can run
/// against a recording double.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn followup(&self, token: &str, message: FollowupMessage) -> anyhow::Result<MessageId>;
    async fn delete_followup(&self, token: &str, message: MessageId) -> anyhow::Result<()>;
}

#[async_trait]
impl Responder for Client {
    async fn followup(&self, token: &str, message: FollowupMessage) -> anyhow::Result<MessageId> {
        Ok(self.create_followup(token, &message).await?.id)
    }

    async fn delete_followup(&self, token: &str, message: MessageId) -> anyhow::Result<()> {
        Ok(Client::delete_followup(self, token, message).await?)
    }
}

/// The fixed guild wiring the flows need.
#[derive(Debug, Clone, Copy)]
pub struct GuildContext {
    pub guild: GuildId,
    pub announce_channel: ChannelId,
    /// Role allowed to delete projects.
    pub admin_role: RoleId,
}

pub struct Orchestrator {
    store: Arc<ProjectStore>,
    provisioner: Arc<dyn Provisioner>,
    announcer: Arc<dyn Announcer>,
    responder: Arc<dyn Responder>,
    audit: AuditLog,
    context: GuildContext,
    confirm_timeout: Duration,
    /// Open delete confirmations, keyed by requesting user and project id.
    pending_deletes: Mutex<HashMap<(UserId, u32), oneshot::Sender<bool>>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<ProjectStore>,
        provisioner: Arc<dyn Provisioner>,
        announcer: Arc<dyn Announcer>,
        responder: Arc<dyn Responder>,
        audit: AuditLog,
        context: GuildContext,
    ) -> Self {
        Self {
            store,
            provisioner,
            announcer,
            responder,
            audit,
            context,
            confirm_timeout: CONFIRM_TIMEOUT,
            pending_deletes: Mutex::new(HashMap::new()),
        }
    }

    /// Shorten the confirmation window (tests).
    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    /// Handle one normalized interaction and produce the inline response.
    pub async fn handle(self: &Arc<Self>, interaction: Interaction) -> InteractionResponse {
        match interaction.kind {
            kind::APPLICATION_COMMAND => self.handle_command(interaction).await,
            kind::MESSAGE_COMPONENT => self.handle_component(interaction).await,
            kind::MODAL_SUBMIT => self.handle_modal(interaction).await,
            other => {
                tracing::debug!(kind = other, "Unsupported interaction type");
                InteractionResponse::message("Unsupported interaction.", true)
            }
        }
    }

    // ── Dispatch ───────────────────────────────────────────────────────

    async fn handle_command(self: &Arc<Self>, interaction: Interaction) -> InteractionResponse {
        let Some(data) = interaction.data.as_ref() else {
            return InteractionResponse::message("Malformed command.", true);
        };
        if data.name.as_deref() != Some("project") {
            return InteractionResponse::message("Unknown command.", true);
        }
        let Some(sub) = data.options.first() else {
            return InteractionResponse::message("Unknown command.", true);
        };

        match sub.name.as_str() {
            "add" => forms::create_modal(),
            "list" => {
                let unminted_only = sub
                    .options
                    .first()
                    .and_then(|o| o.value.as_ref())
                    .and_then(|v| v.as_str())
                    == Some("unminted");
                let this = self.clone();
                let token = interaction.token.clone();
                tokio::spawn(async move { this.run_list(token, unminted_only).await });
                InteractionResponse::deferred(true)
            }
            _ => InteractionResponse::message("Unknown command.", true),
        }
    }

    async fn handle_component(self: &Arc<Self>, interaction: Interaction) -> InteractionResponse {
        let custom_id = interaction
            .data
            .as_ref()
            .and_then(|d| d.custom_id.clone())
            .unwrap_or_default();

        if let Some(id) = custom_id.strip_prefix(CONFIRM_PREFIX).and_then(|s| s.parse().ok()) {
            return self.resolve_confirmation(&interaction, id, true).await;
        }
        if let Some(id) = custom_id.strip_prefix(CANCEL_PREFIX).and_then(|s| s.parse().ok()) {
            return self.resolve_confirmation(&interaction, id, false).await;
        }

        let Some(actor) = interaction.actor().cloned() else {
            return InteractionResponse::message("Malformed interaction.", true);
        };
        let project = match self.resolve_target(&interaction).await {
            Ok(project) => project,
            Err(ProjectNotFound) => {
                return InteractionResponse::message(
                    "This announcement no longer matches a registered project.",
                    true,
                );
            }
        };

        match custom_id.as_str() {
            buttons::ROLE => {
                let this = self.clone();
                let token = interaction.token.clone();
                tokio::spawn(async move { this.run_toggle(actor, token, project).await });
                InteractionResponse::deferred_update()
            }
            buttons::EDIT => forms::edit_modal(&project),
            buttons::DELETE => self.start_delete(&interaction, actor, project).await,
            _ => {
                tracing::debug!(%custom_id, "Unknown component");
                InteractionResponse::deferred_update()
            }
        }
    }

    async fn handle_modal(self: &Arc<Self>, interaction: Interaction) -> InteractionResponse {
        let Some(data) = interaction.data.clone() else {
            return InteractionResponse::message("Malformed form submission.", true);
        };
        let Some(actor) = interaction.actor().cloned() else {
            return InteractionResponse::message("Malformed form submission.", true);
        };
        let custom_id = data.custom_id.clone().unwrap_or_default();
        let token = interaction.token.clone();

        if custom_id == forms::CREATE_MODAL_ID {
            let this = self.clone();
            tokio::spawn(async move { this.run_create(actor, token, data).await });
            return InteractionResponse::deferred(true);
        }
        if let Some(id) = forms::parse_edit_id(&custom_id) {
            let this = self.clone();
            tokio::spawn(async move { this.run_edit(actor, token, id, data).await });
            return InteractionResponse::deferred_update();
        }
        InteractionResponse::message("Unknown form.", true)
    }

    /// Which project does this button press target? The footer id of the
    /// message the component is attached to is the only link back.
    async fn resolve_target(&self, interaction: &Interaction) -> Result<Project, ProjectNotFound> {
        let id = interaction
            .message
            .as_ref()
            .and_then(footer_project_id)
            .ok_or(ProjectNotFound)?;
        self.store.get(id).await.ok_or(ProjectNotFound)
    }

    // ── Create ─────────────────────────────────────────────────────────

    async fn run_create(self: Arc<Self>, actor: User, token: String, data: InteractionData) {
        let mut draft = Project::default();
        forms::apply_submission(&mut draft, &data);
        if draft.name.is_empty() {
            self.notify(&token, "A project needs a name.").await;
            return;
        }

        let group = match self.provisioner.create_group(&draft.name).await {
            Ok(group) => group,
            Err(e) => {
                tracing::warn!(error = %e, name = %draft.name, "Create aborted, nothing persisted");
                self.notify(&token, &format!("Could not create {}: {e}", draft.name)).await;
                return;
            }
        };

        let channel = match self.provisioner.create_restricted_channel(&draft.name, group).await {
            Ok(channel) => channel,
            Err(e) => {
                // Single best-effort rollback; there is no retry queue.
                if let Err(rollback) = self.provisioner.delete_group(group).await {
                    tracing::warn!(error = %rollback, "Rollback of the project group failed");
                }
                tracing::warn!(error = %e, name = %draft.name, "Create aborted, nothing persisted");
                self.notify(&token, &format!("Could not create {}: {e}", draft.name)).await;
                return;
            }
        };

        draft.role_id = group;
        draft.channel_id = channel;

        let (mut project, saved) = self.store.insert(draft).await;
        self.report_save(saved);

        let (embed, rows) = render(&project);
        match self.announcer.publish(embed, rows).await {
            Ok(message_id) => {
                project.message_id = message_id;
                self.report_save(self.store.update(&project).await);

                let url =
                    message_url(self.context.guild, self.context.announce_channel, message_id);
                self.notify(
                    &token,
                    &format!(
                        "{} has been added to the Projects list. Find the announcement [here]({url})",
                        project.name
                    ),
                )
                .await;
                self.audit.created(&actor.username, &project);
            }
            Err(e) => {
                tracing::warn!(error = %e, id = project.id, "Announcement publish failed, record kept");
                self.notify(
                    &token,
                    &format!(
                        "{} was registered, but its announcement could not be published: {e}",
                        project.name
                    ),
                )
                .await;
            }
        }
    }

    // ── Edit ───────────────────────────────────────────────────────────

    async fn run_edit(self: Arc<Self>, actor: User, token: String, id: u32, data: InteractionData) {
        let Some(mut project) = self.store.get(id).await else {
            self.notify(&token, "This announcement no longer matches a registered project.")
                .await;
            return;
        };

        // Full copy before mutation: the diff must see the old values even
        // though the live record is replaced in place.
        let before = project.clone();
        forms::apply_submission(&mut project, &data);

        self.report_save(self.store.update(&project).await);

        let (embed, rows) = render(&project);
        if let Err(e) = self.announcer.update(project.message_id, embed, rows).await {
            tracing::warn!(error = %e, id, "Announcement update failed");
            self.notify(
                &token,
                &format!("The announcement for {} could not be updated: {e}", project.name),
            )
            .await;
        }

        if before.name != project.name {
            // Cosmetic renames come after the announcement; a failure here
            // never rolls back the name already persisted.
            if let Err(e) = self.provisioner.rename_group(project.role_id, &project.name).await {
                tracing::warn!(error = %e, id, "Group rename failed");
            }
            if let Err(e) = self.provisioner.rename_channel(project.channel_id, &project.name).await
            {
                tracing::warn!(error = %e, id, "Channel rename failed");
            }
        }

        self.audit.edited(&actor.username, &project, &before);
    }

    // ── Assign-Role ────────────────────────────────────────────────────

    async fn run_toggle(self: Arc<Self>, actor: User, token: String, project: Project) {
        match self.provisioner.toggle_membership(actor.id, project.role_id).await {
            Ok(change) => {
                tracing::info!(user = %actor.id, project = project.id, ?change, "Toggled membership");
            }
            Err(e) => {
                self.transient_ack(
                    &token,
                    &format!("Could not change your membership for {}: {e}", project.name),
                    FAILURE_ACK_TTL,
                )
                .await;
            }
        }
    }

    // ── Delete ─────────────────────────────────────────────────────────

    async fn start_delete(
        self: &Arc<Self>,
        interaction: &Interaction,
        actor: User,
        project: Project,
    ) -> InteractionResponse {
        let is_admin = interaction
            .member
            .as_ref()
            .is_some_and(|m| m.roles.contains(&self.context.admin_role));
        if !is_admin {
            return InteractionResponse::message(
                "Only members with the admin role can delete projects.",
                true,
            );
        }

        let (tx, rx) = oneshot::channel();
        {
            // A fresh request supersedes a stale confirmation for the same
            // user and project.
            let mut pending = self.pending_deletes.lock().await;
            pending.insert((actor.id, project.id), tx);
        }

        let prompt = format!("Are you sure you want to delete {}?", project.name);
        let row = ActionRow::buttons(vec![
            Button::new(ButtonStyle::Danger, "Confirm", format!("{CONFIRM_PREFIX}{}", project.id)),
            Button::new(ButtonStyle::Secondary, "Cancel", format!("{CANCEL_PREFIX}{}", project.id)),
        ]);

        let this = self.clone();
        let token = interaction.token.clone();
        tokio::spawn(async move { this.await_delete_confirmation(rx, actor, token, project).await });

        InteractionResponse::message_with_components(prompt, vec![row], true)
    }

    async fn await_delete_confirmation(
        self: Arc<Self>,
        rx: oneshot::Receiver<bool>,
        actor: User,
        token: String,
        project: Project,
    ) {
        let key = (actor.id, project.id);
        match tokio::time::timeout(self.confirm_timeout, rx).await {
            Ok(Ok(true)) => self.run_delete(actor, token, project).await,
            // Declined, or the pending entry was superseded. Terminal no-op.
            Ok(_) => {}
            Err(_) => {
                tracing::debug!(project = project.id, "Delete confirmation timed out");
                self.pending_deletes.lock().await.remove(&key);
            }
        }
    }

    async fn resolve_confirmation(
        &self,
        interaction: &Interaction,
        id: u32,
        confirmed: bool,
    ) -> InteractionResponse {
        if let Some(user) = interaction.actor().map(|u| u.id) {
            match self.pending_deletes.lock().await.remove(&(user, id)) {
                Some(tx) => {
                    let _ = tx.send(confirmed);
                }
                // Someone else's prompt, or one that already timed out.
                None => tracing::debug!(project = id, "No pending confirmation for this user"),
            }
        }
        InteractionResponse::deferred_update()
    }

    async fn run_delete(self: Arc<Self>, actor: User, token: String, project: Project) {
        if let Err(e) = self.provisioner.delete_group(project.role_id).await {
            self.delete_failed(&token, &project, &e.to_string()).await;
            return;
        }
        if let Err(e) = self.provisioner.delete_channel(project.channel_id).await {
            self.delete_failed(&token, &project, &e.to_string()).await;
            return;
        }

        let (_, saved) = self.store.remove(project.id).await;
        self.report_save(saved);

        if let Err(e) = self.announcer.delete(project.message_id).await {
            tracing::warn!(error = %e, id = project.id, "Announcement removal failed");
        }

        self.transient_ack(
            &token,
            &format!("Successfully deleted {}", project.name),
            SUCCESS_ACK_TTL,
        )
        .await;
        self.audit.deleted(&actor.username, &project);
    }

    /// The record stays in the registry so the deletion can be retried.
    async fn delete_failed(self: &Arc<Self>, token: &str, project: &Project, reason: &str) {
        tracing::warn!(id = project.id, reason, "Delete stopped, record kept for retry");
        self.transient_ack(
            token,
            &format!("Something went wrong trying to delete {}: {reason}", project.name),
            FAILURE_ACK_TTL,
        )
        .await;
    }

    // ── Listing ────────────────────────────────────────────────────────

    async fn run_list(self: Arc<Self>, token: String, unminted_only: bool) {
        let projects = self.store.snapshot().await;
        let listed: Vec<&Project> =
            projects.iter().filter(|p| !(unminted_only && p.is_minted)).collect();

        if listed.is_empty() {
            self.notify(&token, "No projects have been added yet").await;
            return;
        }

        let mut embed = Embed::new().with_title(if unminted_only {
            "Projects that haven't minted yet"
        } else {
            "All projects"
        });
        for project in listed {
            let url = message_url(
                self.context.guild,
                self.context.announce_channel,
                project.message_id,
            );
            embed = embed.field(&project.name, format!("[Details]({url})"), false);
        }

        if let Err(e) = self.responder.followup(&token, FollowupMessage::embed(embed).ephemeral()).await
        {
            tracing::warn!(error = %e, "Project list delivery failed");
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    /// Ephemeral follow-up that stays; delivery failures are logged only.
    async fn notify(&self, token: &str, content: &str) {
        let _ = self.send_ephemeral(token, content).await;
    }

    async fn send_ephemeral(&self, token: &str, content: &str) -> Option<MessageId> {
        match self.responder.followup(token, FollowupMessage::text(content).ephemeral()).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "Follow-up delivery failed");
                None
            }
        }
    }

    /// Post an ephemeral acknowledgement and schedule its removal. The flow
    /// does not wait for the reaper.
    async fn transient_ack(self: &Arc<Self>, token: &str, content: &str, ttl: Duration) {
        if let Some(message) = self.send_ephemeral(token, content).await {
            let this = self.clone();
            let token = token.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                if let Err(e) = this.responder.delete_followup(&token, message).await {
                    tracing::debug!(error = %e, "Could not reap acknowledgement");
                }
            });
        }
    }

    /// A failed registry write is reported and the flow carries on: the
    /// in-memory list is already correct.
    fn report_save(&self, result: Result<(), StoreError>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, "Registry write failed, in-memory state stays authoritative");
        }
    }
}
