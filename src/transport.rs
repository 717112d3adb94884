//! The narrow surface consumed from the transport collaborator.
//!
//! The gateway, its wire protocol, and the concrete rendering of reply
//! payloads all live behind this trait. The dispatch core only ever pushes
//! schemas, sends/edits/defers replies, and fetches guild entities for lazy
//! option resolution. Every call may fail; failures surface as ordinary
//! errors for the dispatch core to catch.

use anyhow::Result;
use async_trait::async_trait;

use std::fmt;

use crate::model::definition::{CommandKind, CommandScope};
use crate::model::entity::{Channel, Role};
use crate::model::event::EventRef;
use crate::model::wire::WireCommand;

/// One remotely-confirmed command, correlated back to a local definition by
/// `(kind, name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedCommand {
    /// Remote-assigned identifier.
    pub id: String,
    pub kind: CommandKind,
    pub name: String,
}

/// Guild entity kinds the option validator resolves lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Role,
    Channel,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Role => write!(f, "role"),
            EntityKind::Channel => write!(f, "channel"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildEntity {
    Role(Role),
    Channel(Channel),
}

/// Minimal reply payload. Rendering richer payloads (embeds, components) is
/// the transport's concern, layered on top of this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyPayload {
    pub content: String,
    pub ephemeral: bool,
}

impl ReplyPayload {
    pub fn text(content: impl Into<String>) -> Self {
        ReplyPayload {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeferOptions {
    pub ephemeral: bool,
}

/// The transport collaborator.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Idempotent upsert of command schemas for one scope. The confirmed
    /// list carries the remote-assigned identifiers.
    async fn push_command_schemas(
        &self,
        scope: &CommandScope,
        schemas: &[WireCommand],
    ) -> Result<Vec<ConfirmedCommand>>;

    /// Send the initial reply to an interaction.
    async fn reply(&self, event: &EventRef, payload: &ReplyPayload) -> Result<()>;

    /// Acknowledge an interaction before the real reply is ready.
    async fn defer_reply(&self, event: &EventRef, opts: DeferOptions) -> Result<()>;

    /// Edit the reply of a previously-deferred interaction.
    async fn edit_reply(&self, event: &EventRef, payload: &ReplyPayload) -> Result<()>;

    /// Fetch one guild entity by id. `Ok(None)` is a miss (the entity does
    /// not exist), distinct from a transport failure.
    async fn fetch_guild_entity(
        &self,
        guild_id: &str,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<GuildEntity>>;
}
