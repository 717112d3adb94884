//! Dispatch orchestration and the result pipeline.
//!
//! - **Version**: 2.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.2.0: Replaceable result-handler hook
//! - 2.0.0: One run order for commands, components, and modals
//! - 1.0.0: Initial command dispatch
//!
//! Per dispatch, terminal on first exit:
//! received → resolved → precheck → [optionally deferred] → middleware →
//! option validation → handler → result handling. Resolution misses drop
//! the event with a log line and no reply; everything at or above the
//! handler boundary funnels into one [`Outcome`] handed to the result
//! handler. The transport's event callback never observes an error from
//! [`Dispatcher::handle`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::DispatcherConfig;
use crate::context::DispatchContext;
use crate::error::{LoadError, ResolutionError};
use crate::middleware::{Middleware, Pipeline};
use crate::model::definition::{CommandScope, CommandSpec, ComponentSpec, Invocable, RunFlags};
use crate::model::event::{
    CommandEvent, ComponentEvent, ComponentKind, EventRef, InteractionEvent, ModalEvent,
};
use crate::model::wire::{to_wire, WireCommand};
use crate::outcome::{Failure, Outcome, Success};
use crate::registry::commands::{command_key, CommandEntry, CommandRegistry};
use crate::registry::components::ComponentRegistry;
use crate::transport::{ConfirmedCommand, DeferOptions, ReplyPayload, Transport};
use crate::validate::OptionValidator;

/// Everything the result handler learns about a finished dispatch.
pub struct DispatchReport {
    pub request_id: Uuid,
    /// Short label of the originating event, for log lines.
    pub label: String,
    pub event_ref: EventRef,
    /// Whether the dispatch was acknowledged before the handler ran; decides
    /// which reply path is still valid.
    pub deferred: bool,
    pub started: Instant,
    pub finished: Instant,
    pub outcome: Outcome,
}

/// Terminal callback turning the final outcome into a user-visible reply
/// and/or a log line. Replaceable by the embedding application.
#[async_trait]
pub trait ResultHandler: Send + Sync {
    async fn handle(&self, report: DispatchReport, transport: &dyn Transport);
}

/// Default behavior: log successes, and on failure log the diagnostics and
/// send a generic reply carrying only the correlation id — internals never
/// reach the end user.
pub struct DefaultResultHandler {
    error_message: String,
}

impl DefaultResultHandler {
    pub fn new(error_message: impl Into<String>) -> Self {
        DefaultResultHandler {
            error_message: error_message.into(),
        }
    }
}

#[async_trait]
impl ResultHandler for DefaultResultHandler {
    async fn handle(&self, report: DispatchReport, transport: &dyn Transport) {
        let elapsed = report.finished.duration_since(report.started);
        match &report.outcome {
            Outcome::Success(Success::Done) => {
                info!(
                    "[{}] {} completed in {}ms",
                    report.request_id,
                    report.label,
                    elapsed.as_millis()
                );
            }
            Outcome::Success(Success::Status(status)) => {
                info!(
                    "[{}] {} ended with status `{status}` in {}ms",
                    report.request_id,
                    report.label,
                    elapsed.as_millis()
                );
            }
            Outcome::Failure(failure) => {
                error!(
                    "[{}] {} failed after {}ms: {}",
                    report.request_id,
                    report.label,
                    elapsed.as_millis(),
                    failure.message
                );
                if let Some(original) = &failure.original_error {
                    error!("[{}] original error: {original:#}", report.request_id);
                }
                for (key, value) in &failure.debug {
                    debug!("[{}]   {key}: {value}", report.request_id);
                }

                let payload = ReplyPayload::text(format!(
                    "{} (ref: {})",
                    self.error_message, report.request_id
                ))
                .ephemeral();
                let sent = if report.deferred {
                    transport.edit_reply(&report.event_ref, &payload).await
                } else {
                    transport.reply(&report.event_ref, &payload).await
                };
                if let Err(nested) = sent {
                    // Not retried; the dispatch simply ends here.
                    error!(
                        "[{}] failure reply could not be delivered: {nested:#}",
                        report.request_id
                    );
                }
            }
        }
    }
}

/// The interaction dispatcher. Owns the registries, the middleware chain,
/// and the result-handler hook; drives every inbound event through the run
/// order.
pub struct Dispatcher {
    config: DispatcherConfig,
    transport: Arc<dyn Transport>,
    commands: CommandRegistry,
    components: ComponentRegistry,
    pipeline: Pipeline,
    result_handler: Arc<dyn ResultHandler>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, config: DispatcherConfig) -> Self {
        let result_handler = Arc::new(DefaultResultHandler::new(config.error_message.clone()));
        Dispatcher {
            config,
            transport,
            commands: CommandRegistry::new(),
            components: ComponentRegistry::new(),
            pipeline: Pipeline::new(),
            result_handler,
        }
    }

    /// Pure transform of local definitions into the wire schemas to push.
    pub fn load_commands(specs: &[CommandSpec]) -> Result<Vec<WireCommand>, LoadError> {
        let mut schemas = Vec::new();
        for spec in specs {
            schemas.extend(to_wire(spec)?);
        }
        Ok(schemas)
    }

    /// Map remote-confirmed identifiers back to local handlers.
    pub fn resolve_commands(
        &mut self,
        specs: &[CommandSpec],
        confirmed: &[ConfirmedCommand],
        scope: &CommandScope,
    ) {
        self.commands.resolve(specs, confirmed, scope);
    }

    /// The push-and-fetch round trip: transform, push, resolve. Returns the
    /// number of registered entries afterwards.
    pub async fn sync_commands(
        &mut self,
        specs: &[CommandSpec],
        scope: &CommandScope,
    ) -> Result<usize> {
        let schemas = Self::load_commands(specs)?;
        let confirmed = self
            .transport
            .push_command_schemas(scope, &schemas)
            .await?;
        self.resolve_commands(specs, &confirmed, scope);
        info!(
            "synced {} command schemas, {} handlers registered",
            schemas.len(),
            self.commands.len()
        );
        Ok(self.commands.len())
    }

    pub fn load_components(&mut self, specs: Vec<ComponentSpec>) -> Result<(), LoadError> {
        for spec in specs {
            self.components.register(spec)?;
        }
        Ok(())
    }

    /// Append one middleware; the chain runs in registration order.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.pipeline.push(middleware);
    }

    pub fn set_result_handler(&mut self, handler: Arc<dyn ResultHandler>) {
        self.result_handler = handler;
    }

    /// Drop all registrations, e.g. ahead of a reconnect re-sync.
    pub fn clear_registrations(&mut self) {
        self.commands.clear();
        self.components.clear();
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Entry point for the transport's event callback. Catches everything
    /// internally; the callback never observes an error.
    pub async fn handle(&self, event: InteractionEvent) {
        let request_id = Uuid::new_v4();
        debug!("[{request_id}] received {}", event.label());
        match event {
            InteractionEvent::Command(ev) => self.dispatch_command(ev, request_id).await,
            InteractionEvent::Component(ev) => self.dispatch_component(ev, request_id).await,
            InteractionEvent::Modal(ev) => self.dispatch_modal(ev, request_id).await,
        }
    }

    async fn dispatch_command(&self, event: CommandEvent, request_id: Uuid) {
        let Some(registered) = self
            .commands
            .find(&event.scope, &event.command_id, &event.name)
        else {
            // No handler to attribute a response to: log and drop.
            warn!(
                "[{request_id}] {}",
                ResolutionError::UnknownCommand {
                    key: command_key(&event.scope, &event.command_id, &event.name),
                }
            );
            return;
        };

        let invocable = match &registered.entry {
            CommandEntry::Direct(invocable) => invocable.clone(),
            CommandEntry::Tree(tree) => {
                match tree.descend(
                    &event.name,
                    event.subcommand_group.as_deref(),
                    event.subcommand.as_deref(),
                ) {
                    Ok(sub) => sub.run.clone(),
                    Err(miss) => {
                        warn!("[{request_id}] {miss}");
                        return;
                    }
                }
            }
        };

        let ctx = DispatchContext::new(
            InteractionEvent::Command(event),
            self.transport.clone(),
            request_id,
        );
        self.run_invocable(ctx, invocable).await;
    }

    async fn dispatch_component(&self, event: ComponentEvent, request_id: Uuid) {
        let Some(entry) = self.components.find(event.kind, &event.custom_id) else {
            warn!(
                "[{request_id}] {}",
                ResolutionError::UnknownComponent {
                    kind: event.kind,
                    custom_id: event.custom_id.clone(),
                }
            );
            return;
        };

        let author_mismatch = entry.author_only
            && matches!(&event.invoker_id, Some(invoker) if *invoker != event.user.id);

        let ctx = DispatchContext::new(
            InteractionEvent::Component(event),
            self.transport.clone(),
            request_id,
        );

        if author_mismatch {
            debug!("[{request_id}] author-only component used by another user");
            let payload =
                ReplyPayload::text(self.config.author_only_message.clone()).ephemeral();
            if let Err(e) = ctx.reply(&payload).await {
                error!("[{request_id}] author-only reply failed: {e:#}");
            }
            self.finish(ctx, Outcome::status("author-only")).await;
            return;
        }

        let invocable = Invocable {
            options: BTreeMap::new(),
            flags: entry.flags,
            handler: entry.handler.clone(),
        };
        self.run_invocable(ctx, invocable).await;
    }

    async fn dispatch_modal(&self, event: ModalEvent, request_id: Uuid) {
        let Some(entry) = self.components.find(ComponentKind::Modal, &event.custom_id) else {
            warn!(
                "[{request_id}] {}",
                ResolutionError::UnknownComponent {
                    kind: ComponentKind::Modal,
                    custom_id: event.custom_id.clone(),
                }
            );
            return;
        };

        let ctx = DispatchContext::new(
            InteractionEvent::Modal(event),
            self.transport.clone(),
            request_id,
        );
        let invocable = Invocable {
            options: BTreeMap::new(),
            flags: entry.flags,
            handler: entry.handler.clone(),
        };
        self.run_invocable(ctx, invocable).await;
    }

    /// The shared run order once a handler is resolved.
    async fn run_invocable(&self, mut ctx: DispatchContext, invocable: Invocable) {
        let request_id = ctx.request_id();

        // Gates run before any reply goes out.
        if let Some(reason) = self.precheck(&ctx, &invocable.flags) {
            debug!("[{request_id}] precheck denied: {reason}");
            let payload = ReplyPayload::text(self.config.denial_message.clone()).ephemeral();
            if let Err(e) = ctx.reply(&payload).await {
                error!("[{request_id}] denial reply failed: {e:#}");
            }
            self.finish(ctx, Outcome::status("denied")).await;
            return;
        }

        if invocable.flags.pre_reply {
            let opts = DeferOptions {
                ephemeral: invocable.flags.ephemeral,
            };
            if let Err(e) = self.transport.defer_reply(ctx.event_ref(), opts).await {
                // Failing to acknowledge is fatal to the dispatch.
                error!("[{request_id}] failed to acknowledge interaction: {e:#}");
                let payload = ReplyPayload::text(format!(
                    "{} (ref: {request_id})",
                    self.config.error_message
                ))
                .ephemeral();
                if let Err(nested) = self.transport.reply(ctx.event_ref(), &payload).await {
                    error!("[{request_id}] error reply could not be delivered: {nested:#}");
                }
                return;
            }
            ctx.mark_deferred();
        }

        match self.pipeline.run(&mut ctx).await {
            Ok(None) => {}
            Ok(Some(cancelled)) => {
                self.finish(ctx, cancelled).await;
                return;
            }
            Err(error) => {
                // Middleware errors normalize exactly like handler errors.
                self.finish(ctx, Outcome::Failure(Failure::unexpected(error)))
                    .await;
                return;
            }
        }

        let validated = match ctx.event() {
            InteractionEvent::Command(event) if !invocable.options.is_empty() => {
                let validator =
                    OptionValidator::new(self.transport.as_ref(), event.guild_id.as_deref());
                Some(validator.validate(&event.options, &invocable.options).await)
            }
            _ => None,
        };
        match validated {
            None => {}
            Some(Ok(Ok(resolved))) => ctx.set_options(resolved),
            Some(Ok(Err(rejected))) => {
                debug!(
                    "[{request_id}] option `{}` rejected: {}",
                    rejected.option, rejected.kind
                );
                self.finish(ctx, Outcome::Failure(rejected.into_failure()))
                    .await;
                return;
            }
            Some(Err(error)) => {
                // Lazy resolution hit a transport failure.
                self.finish(ctx, Outcome::Failure(Failure::unexpected(error)))
                    .await;
                return;
            }
        }

        let outcome = match invocable.handler.run(&mut ctx).await {
            Ok(outcome) => outcome,
            Err(error) => Outcome::Failure(Failure::unexpected(error)),
        };
        self.finish(ctx, outcome).await;
    }

    fn precheck(&self, ctx: &DispatchContext, flags: &RunFlags) -> Option<&'static str> {
        if flags.developer_only && !self.config.developers.contains(&ctx.user().id) {
            return Some("developer-only handler");
        }
        if let Some(required) = flags.required_permissions {
            match ctx.member_permissions() {
                Some(held) if held.contains(required) => {}
                _ => return Some("missing required permissions"),
            }
        }
        None
    }

    async fn finish(&self, ctx: DispatchContext, outcome: Outcome) {
        let report = DispatchReport {
            request_id: ctx.request_id(),
            label: ctx.event().label(),
            event_ref: ctx.event_ref().clone(),
            deferred: ctx.deferred(),
            started: ctx.started(),
            finished: Instant::now(),
            outcome,
        };
        self.result_handler
            .handle(report, self.transport.as_ref())
            .await;
    }
}
