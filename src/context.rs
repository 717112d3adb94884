//! Per-dispatch context.
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Single parametrized context for every interaction kind
//! - 1.0.0: Initial per-kind context objects
//!
//! One context value per in-flight dispatch, exclusively owned by it and
//! never reused across events. The guild/DM distinction is a capability
//! check (`in_guild`), not a subclass.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use uuid::Uuid;

use crate::model::entity::User;
use crate::model::event::{EventRef, InteractionEvent};
use crate::model::options::ResolvedOptions;
use crate::model::wire::Permissions;
use crate::transport::{ReplyPayload, Transport};

/// The additive bag middleware contributions land in, keyed by the
/// contributing middleware's name. Values are read back through the typed
/// accessor; a wrong type reads as absent.
#[derive(Default)]
pub struct Additional {
    values: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl Additional {
    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.values.get(name)?.downcast_ref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(&mut self, name: &'static str, value: Box<dyn Any + Send + Sync>) {
        self.values.insert(name, value);
    }
}

/// Everything a handler (or middleware) sees about the dispatch in flight.
pub struct DispatchContext {
    event: InteractionEvent,
    transport: Arc<dyn Transport>,
    request_id: Uuid,
    started: Instant,
    deferred: bool,
    additional: Additional,
    options: ResolvedOptions,
}

impl DispatchContext {
    pub(crate) fn new(
        event: InteractionEvent,
        transport: Arc<dyn Transport>,
        request_id: Uuid,
    ) -> Self {
        DispatchContext {
            event,
            transport,
            request_id,
            started: Instant::now(),
            deferred: false,
            additional: Additional::default(),
            options: ResolvedOptions::default(),
        }
    }

    pub fn event(&self) -> &InteractionEvent {
        &self.event
    }

    pub fn event_ref(&self) -> &EventRef {
        self.event.event_ref()
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn user(&self) -> &User {
        self.event.user()
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.event.guild_id()
    }

    pub fn in_guild(&self) -> bool {
        self.event.guild_id().is_some()
    }

    pub fn member_permissions(&self) -> Option<Permissions> {
        self.event.member_permissions()
    }

    /// Whether the dispatch was acknowledged ahead of the handler body.
    pub fn deferred(&self) -> bool {
        self.deferred
    }

    // Flipped at most once, by the dispatcher, after a successful defer.
    pub(crate) fn mark_deferred(&mut self) {
        debug_assert!(!self.deferred, "defer flag already flipped");
        self.deferred = true;
    }

    pub fn additional(&self) -> &Additional {
        &self.additional
    }

    pub(crate) fn additional_mut(&mut self) -> &mut Additional {
        &mut self.additional
    }

    /// Validated options (commands only; empty for components and modals).
    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub(crate) fn set_options(&mut self, options: ResolvedOptions) {
        self.options = options;
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Reply to the interaction through whichever transport call is valid:
    /// a fresh reply normally, an edit of the acknowledgement after a defer.
    pub async fn reply(&self, payload: &ReplyPayload) -> Result<()> {
        if self.deferred {
            self.transport
                .edit_reply(self.event.event_ref(), payload)
                .await
        } else {
            self.transport.reply(self.event.event_ref(), payload).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_command_event, test_transport};

    #[test]
    fn test_additional_typed_access() {
        let mut additional = Additional::default();
        additional.insert("auth", Box::new("admin".to_string()));
        additional.insert("cooldown", Box::new(42u64));

        assert_eq!(additional.get::<String>("auth"), Some(&"admin".to_string()));
        assert_eq!(additional.get::<u64>("cooldown"), Some(&42));
        // Wrong type reads as absent.
        assert_eq!(additional.get::<u64>("auth"), None);
        assert_eq!(additional.get::<String>("missing"), None);
    }

    #[tokio::test]
    async fn test_reply_routes_by_defer_state() {
        let transport = test_transport();
        let mut ctx = DispatchContext::new(
            InteractionEvent::Command(test_command_event("ping")),
            transport.clone(),
            Uuid::new_v4(),
        );

        ctx.reply(&ReplyPayload::text("pong")).await.unwrap();
        assert_eq!(transport.replies(), vec!["pong".to_string()]);
        assert!(transport.edits().is_empty());

        ctx.mark_deferred();
        ctx.reply(&ReplyPayload::text("edited")).await.unwrap();
        assert_eq!(transport.edits(), vec!["edited".to_string()]);
    }

    #[test]
    fn test_in_guild_capability_check() {
        let transport = test_transport();
        let mut event = test_command_event("ping");
        event.guild_id = None;
        let ctx = DispatchContext::new(
            InteractionEvent::Command(event),
            transport,
            Uuid::new_v4(),
        );
        assert!(!ctx.in_guild());
    }
}
