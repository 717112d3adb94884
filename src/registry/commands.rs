//! Command registry and resolver.
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Resolved keys derived from remote-assigned identifiers
//! - 1.0.0: Name-keyed handler registry
//!
//! Local definitions are pushed remotely as wire schemas; once the remote
//! confirms them, this registry maps the resolved key — derived from the
//! remote-assigned identifier and the registration scope — back to the local
//! handler. Keys live for the lifetime of the connection and are never
//! persisted.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::model::definition::{
    CommandKind, CommandScope, CommandSpec, Invocable, SlashAction, SubCommandTree,
};
use crate::transport::ConfirmedCommand;

/// The join key between a remote-confirmed command identity and its local
/// handler: `{scope_prefix}{remote_id}:{name}`.
pub fn command_key(scope: &CommandScope, remote_id: &str, name: &str) -> String {
    format!("{}{}:{}", scope.key_prefix(), remote_id, name)
}

/// What a resolved key points at: a direct run target, or a subcommand tree
/// to descend at dispatch time.
#[derive(Clone)]
pub enum CommandEntry {
    Direct(Invocable),
    Tree(SubCommandTree),
}

#[derive(Clone)]
pub struct RegisteredCommand {
    pub name: String,
    pub kind: CommandKind,
    pub entry: CommandEntry,
}

/// Registry mapping resolved keys to local handlers.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    entries: HashMap<String, Arc<RegisteredCommand>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        CommandRegistry::default()
    }

    /// Correlate local definitions with the remote-confirmed list and insert
    /// one entry per confirmed variant. A variant the remote did not confirm
    /// is logged and skipped: the command is unreachable until the next
    /// sync, but the rest of the batch registers normally. Resolving the
    /// same confirmed list again is idempotent.
    pub fn resolve(
        &mut self,
        specs: &[CommandSpec],
        confirmed: &[ConfirmedCommand],
        scope: &CommandScope,
    ) {
        for spec in specs {
            if let Some(slash) = &spec.slash {
                let entry = match &slash.action {
                    SlashAction::Run(invocable) => CommandEntry::Direct(invocable.clone()),
                    SlashAction::Subcommands(tree) => CommandEntry::Tree(tree.clone()),
                };
                self.resolve_variant(CommandKind::Slash, &slash.declaration.name, entry, confirmed, scope);
            }
            if let Some(user) = &spec.user {
                self.resolve_variant(
                    CommandKind::User,
                    &user.declaration.name,
                    CommandEntry::Direct(user.run.clone()),
                    confirmed,
                    scope,
                );
            }
            if let Some(message) = &spec.message {
                self.resolve_variant(
                    CommandKind::Message,
                    &message.declaration.name,
                    CommandEntry::Direct(message.run.clone()),
                    confirmed,
                    scope,
                );
            }
        }
    }

    fn resolve_variant(
        &mut self,
        kind: CommandKind,
        name: &str,
        entry: CommandEntry,
        confirmed: &[ConfirmedCommand],
        scope: &CommandScope,
    ) {
        match confirmed.iter().find(|c| c.kind == kind && c.name == name) {
            Some(remote) => {
                let key = command_key(scope, &remote.id, name);
                debug!("registered {kind} command `{name}` under key `{key}`");
                self.entries.insert(
                    key,
                    Arc::new(RegisteredCommand {
                        name: name.to_string(),
                        kind,
                        entry,
                    }),
                );
            }
            None => {
                warn!(
                    "remote did not confirm {kind} command `{name}`; \
                     it stays unreachable until the next sync"
                );
            }
        }
    }

    /// Dispatch-time lookup by the key computed from an incoming event.
    pub fn find(
        &self,
        scope: &CommandScope,
        remote_id: &str,
        name: &str,
    ) -> Option<Arc<RegisteredCommand>> {
        self.entries.get(&command_key(scope, remote_id, name)).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::definition::{ContextCommand, SlashCommand, SubCommand};
    use crate::testing::NoopHandler;

    fn confirmed(id: &str, kind: CommandKind, name: &str) -> ConfirmedCommand {
        ConfirmedCommand {
            id: id.to_string(),
            kind,
            name: name.to_string(),
        }
    }

    fn ping_spec() -> CommandSpec {
        CommandSpec::new("ping")
            .slash(SlashCommand::new("ping", "Check liveness", Arc::new(NoopHandler)))
    }

    #[test]
    fn test_resolve_inserts_confirmed_variants() {
        let mut registry = CommandRegistry::new();
        let specs = vec![ping_spec()];
        let confirmed = vec![confirmed("1111", CommandKind::Slash, "ping")];

        registry.resolve(&specs, &confirmed, &CommandScope::Global);

        assert_eq!(registry.len(), 1);
        let entry = registry.find(&CommandScope::Global, "1111", "ping").unwrap();
        assert_eq!(entry.kind, CommandKind::Slash);
        assert!(matches!(entry.entry, CommandEntry::Direct(_)));
    }

    #[test]
    fn test_unconfirmed_variant_skipped_not_fatal() {
        let mut registry = CommandRegistry::new();
        let specs = vec![
            ping_spec(),
            CommandSpec::new("avatar").slash(SlashCommand::new(
                "avatar",
                "Show avatars",
                Arc::new(NoopHandler),
            )),
        ];
        // Only avatar confirmed; ping silently unreachable.
        let confirmed = vec![confirmed("2222", CommandKind::Slash, "avatar")];

        registry.resolve(&specs, &confirmed, &CommandScope::Global);

        assert_eq!(registry.len(), 1);
        assert!(registry.find(&CommandScope::Global, "2222", "avatar").is_some());
    }

    #[test]
    fn test_kind_and_name_both_required_to_match() {
        let mut registry = CommandRegistry::new();
        let specs = vec![CommandSpec::new("profile")
            .user(ContextCommand::new("profile", Arc::new(NoopHandler)))];
        // Same name, wrong kind: no match.
        let confirmed = vec![confirmed("3333", CommandKind::Slash, "profile")];

        registry.resolve(&specs, &confirmed, &CommandScope::Global);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_guild_and_global_keys_never_collide() {
        let mut registry = CommandRegistry::new();
        let specs = vec![ping_spec()];
        let confirmed = vec![confirmed("1111", CommandKind::Slash, "ping")];

        registry.resolve(&specs, &confirmed, &CommandScope::Global);
        registry.resolve(&specs, &confirmed, &CommandScope::Guild("500".to_string()));

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.keys(),
            vec!["1111:ping".to_string(), "guild:1111:ping".to_string()]
        );
        assert!(registry.find(&CommandScope::Global, "1111", "ping").is_some());
        assert!(registry
            .find(&CommandScope::Guild("500".to_string()), "1111", "ping")
            .is_some());
    }

    #[test]
    fn test_distinct_confirmed_commands_have_distinct_keys() {
        let specs = vec![
            ping_spec(),
            CommandSpec::new("profile")
                .slash(SlashCommand::new("profile", "Show a profile", Arc::new(NoopHandler)))
                .user(ContextCommand::new("profile", Arc::new(NoopHandler))),
        ];
        let confirmed = vec![
            confirmed("1111", CommandKind::Slash, "ping"),
            confirmed("4444", CommandKind::Slash, "profile"),
            confirmed("5555", CommandKind::User, "profile"),
        ];

        let mut registry = CommandRegistry::new();
        registry.resolve(&specs, &confirmed, &CommandScope::Global);

        let keys = registry.keys();
        assert_eq!(keys.len(), 3);
        let mut deduped = keys.clone();
        deduped.dedup();
        assert_eq!(keys, deduped);
    }

    #[test]
    fn test_resolving_twice_is_idempotent() {
        let specs = vec![ping_spec()];
        let confirmed = vec![confirmed("1111", CommandKind::Slash, "ping")];

        let mut registry = CommandRegistry::new();
        registry.resolve(&specs, &confirmed, &CommandScope::Global);
        let first_keys = registry.keys();

        registry.resolve(&specs, &confirmed, &CommandScope::Global);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.keys(), first_keys);
    }

    #[test]
    fn test_subcommand_tree_registers_as_tree_entry() {
        let tree = SubCommandTree::new()
            .subcommand("status", SubCommand::new("Show status", Arc::new(NoopHandler)));
        let specs = vec![CommandSpec::new("registry")
            .slash(SlashCommand::group("registry", "Registry management", tree))];
        let confirmed = vec![confirmed("6666", CommandKind::Slash, "registry")];

        let mut registry = CommandRegistry::new();
        registry.resolve(&specs, &confirmed, &CommandScope::Global);

        let entry = registry.find(&CommandScope::Global, "6666", "registry").unwrap();
        assert!(matches!(entry.entry, CommandEntry::Tree(_)));
    }

    #[test]
    fn test_clear_empties_registry() {
        let mut registry = CommandRegistry::new();
        registry.resolve(
            &[ping_spec()],
            &[confirmed("1111", CommandKind::Slash, "ping")],
            &CommandScope::Global,
        );
        assert!(!registry.is_empty());
        registry.clear();
        assert!(registry.is_empty());
    }
}
