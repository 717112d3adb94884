//! Shared mocks for the inline test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::context::DispatchContext;
use crate::model::definition::{CommandKind, CommandScope, Handler};
use crate::model::entity::User;
use crate::model::event::{CommandEvent, ComponentEvent, ComponentKind, EventRef};
use crate::model::wire::WireCommand;
use crate::outcome::Outcome;
use crate::transport::{
    ConfirmedCommand, DeferOptions, EntityKind, GuildEntity, ReplyPayload, Transport,
};

/// Route `log` output through the test harness when a test opts in.
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn test_user() -> User {
    User {
        id: "100".to_string(),
        username: "tester".to_string(),
        bot: false,
    }
}

pub(crate) fn test_command_event(name: &str) -> CommandEvent {
    CommandEvent {
        event_ref: EventRef::new("evt-1", "token-1"),
        command_id: "9000".to_string(),
        name: name.to_string(),
        kind: CommandKind::Slash,
        scope: CommandScope::Global,
        guild_id: Some("500".to_string()),
        channel_id: "9".to_string(),
        user: test_user(),
        member_permissions: None,
        subcommand_group: None,
        subcommand: None,
        options: HashMap::new(),
        target_id: None,
    }
}

pub(crate) fn test_component_event(kind: ComponentKind, custom_id: &str) -> ComponentEvent {
    ComponentEvent {
        event_ref: EventRef::new("evt-2", "token-2"),
        kind,
        custom_id: custom_id.to_string(),
        guild_id: Some("500".to_string()),
        channel_id: "9".to_string(),
        user: test_user(),
        member_permissions: None,
        invoker_id: None,
        values: Vec::new(),
    }
}

/// Handler that succeeds without doing anything.
pub(crate) struct NoopHandler;

#[async_trait]
impl Handler for NoopHandler {
    async fn run(&self, _ctx: &mut DispatchContext) -> Result<Outcome> {
        Ok(Outcome::ok())
    }
}

/// Handler that counts invocations and succeeds.
pub(crate) struct CountingHandler {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler for CountingHandler {
    async fn run(&self, _ctx: &mut DispatchContext) -> Result<Outcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Outcome::ok())
    }
}

/// Transport double that records every call and can be scripted to fail or
/// to resolve guild entities.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    replies: Mutex<Vec<ReplyPayload>>,
    edits: Mutex<Vec<ReplyPayload>>,
    defers: Mutex<Vec<DeferOptions>>,
    pushed: Mutex<Vec<WireCommand>>,
    confirmed: Mutex<Vec<ConfirmedCommand>>,
    entities: Mutex<HashMap<String, GuildEntity>>,
    fail_replies: AtomicBool,
    fail_defers: AtomicBool,
}

impl RecordingTransport {
    pub fn replies(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.content.clone())
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.edits
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.content.clone())
            .collect()
    }

    pub fn last_reply_payload(&self) -> Option<ReplyPayload> {
        self.replies.lock().unwrap().last().cloned()
    }

    pub fn defer_count(&self) -> usize {
        self.defers.lock().unwrap().len()
    }

    pub fn pushed(&self) -> Vec<WireCommand> {
        self.pushed.lock().unwrap().clone()
    }

    pub fn confirm(&self, commands: Vec<ConfirmedCommand>) {
        *self.confirmed.lock().unwrap() = commands;
    }

    pub fn insert_entity(&self, id: &str, entity: GuildEntity) {
        self.entities.lock().unwrap().insert(id.to_string(), entity);
    }

    pub fn fail_replies(&self) {
        self.fail_replies.store(true, Ordering::SeqCst);
    }

    pub fn fail_defers(&self) {
        self.fail_defers.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn push_command_schemas(
        &self,
        _scope: &CommandScope,
        schemas: &[WireCommand],
    ) -> Result<Vec<ConfirmedCommand>> {
        self.pushed.lock().unwrap().extend_from_slice(schemas);
        Ok(self.confirmed.lock().unwrap().clone())
    }

    async fn reply(&self, _event: &EventRef, payload: &ReplyPayload) -> Result<()> {
        if self.fail_replies.load(Ordering::SeqCst) {
            return Err(anyhow!("reply transport down"));
        }
        self.replies.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn defer_reply(&self, _event: &EventRef, opts: DeferOptions) -> Result<()> {
        if self.fail_defers.load(Ordering::SeqCst) {
            return Err(anyhow!("defer transport down"));
        }
        self.defers.lock().unwrap().push(opts);
        Ok(())
    }

    async fn edit_reply(&self, _event: &EventRef, payload: &ReplyPayload) -> Result<()> {
        if self.fail_replies.load(Ordering::SeqCst) {
            return Err(anyhow!("edit transport down"));
        }
        self.edits.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn fetch_guild_entity(
        &self,
        _guild_id: &str,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<GuildEntity>> {
        let entities = self.entities.lock().unwrap();
        Ok(entities.get(id).cloned().filter(|entity| {
            matches!(
                (kind, entity),
                (EntityKind::Role, GuildEntity::Role(_))
                    | (EntityKind::Channel, GuildEntity::Channel(_))
            )
        }))
    }
}

pub(crate) fn test_transport() -> Arc<RecordingTransport> {
    Arc::new(RecordingTransport::default())
}
