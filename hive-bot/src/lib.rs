//! hive-bot: community project management over Discord.
//!
//! Members create "projects": community sub-groups backed by a role, a
//! restricted channel and an announcement message with Role/Edit/Delete
//! buttons. A JSON registry tracks the provisioned resources and every
//! create/edit/delete is audited to a logging channel.

pub mod announce;
pub mod audit;
pub mod config;
pub mod forms;
pub mod orchestrator;
pub mod project;
pub mod provision;
pub mod store;
pub mod web;
