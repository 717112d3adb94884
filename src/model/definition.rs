//! Local command and component definitions.
//!
//! - **Version**: 2.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.1.0: Matcher mode on component specs
//! - 2.0.0: Tagged unions instead of structural kind probing
//! - 1.0.0: Initial declarative definitions
//!
//! Definitions are plain data plus an `Arc<dyn Handler>` run target; no
//! subclassing anywhere. A command definition may declare any combination of
//! the slash/user/message variants, but at least one — declaring none is a
//! configuration error caught when the definition is loaded.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::context::DispatchContext;
use crate::error::ResolutionError;
use crate::model::event::ComponentKind;
use crate::model::options::OptionSchema;
use crate::model::wire::{InteractionContextType, IntegrationType, Permissions};
use crate::outcome::Outcome;

/// Discriminant for the three command variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Slash,
    User,
    Message,
}

impl CommandKind {
    pub fn wire_code(self) -> u8 {
        match self {
            CommandKind::Slash => 1,
            CommandKind::User => 2,
            CommandKind::Message => 3,
        }
    }

    pub fn from_wire_code(code: u8) -> Option<CommandKind> {
        match code {
            1 => Some(CommandKind::Slash),
            2 => Some(CommandKind::User),
            3 => Some(CommandKind::Message),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Slash => write!(f, "slash"),
            CommandKind::User => write!(f, "user"),
            CommandKind::Message => write!(f, "message"),
        }
    }
}

/// Registration scope of a batch of commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandScope {
    Global,
    Guild(String),
}

impl CommandScope {
    /// Fixed key prefix distinguishing guild-scoped entries from global ones.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            CommandScope::Global => "",
            CommandScope::Guild(_) => "guild:",
        }
    }
}

/// User-supplied logic bound to a command, subcommand, or component matcher.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn run(&self, ctx: &mut DispatchContext) -> Result<Outcome>;
}

/// Per-handler dispatch switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    /// Acknowledge the interaction before the handler body runs.
    pub pre_reply: bool,
    /// Make the acknowledgement (and default replies) ephemeral.
    pub ephemeral: bool,
    pub developer_only: bool,
    pub required_permissions: Option<Permissions>,
}

/// Fields shared by every command variant on the wire.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    pub name: String,
    pub name_localizations: BTreeMap<String, String>,
    pub default_member_permissions: Option<Permissions>,
    pub nsfw: Option<bool>,
    pub contexts: Option<Vec<InteractionContextType>>,
    pub integration_types: Option<Vec<IntegrationType>>,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Declaration {
            name: name.into(),
            ..Declaration::default()
        }
    }
}

/// What the dispatcher ultimately runs: a handler plus its declared options
/// and dispatch switches.
#[derive(Clone)]
pub struct Invocable {
    pub options: BTreeMap<String, OptionSchema>,
    pub flags: RunFlags,
    pub handler: Arc<dyn Handler>,
}

impl Invocable {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Invocable {
            options: BTreeMap::new(),
            flags: RunFlags::default(),
            handler,
        }
    }
}

/// Run target of a slash command: a direct handler or a subcommand tree.
#[derive(Clone)]
pub enum SlashAction {
    Run(Invocable),
    Subcommands(SubCommandTree),
}

/// A slash command variant.
#[derive(Clone)]
pub struct SlashCommand {
    pub declaration: Declaration,
    pub description: String,
    pub action: SlashAction,
}

impl SlashCommand {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        SlashCommand {
            declaration: Declaration::new(name),
            description: description.into(),
            action: SlashAction::Run(Invocable::new(handler)),
        }
    }

    /// A slash command whose run targets live in a subcommand tree.
    pub fn group(
        name: impl Into<String>,
        description: impl Into<String>,
        tree: SubCommandTree,
    ) -> Self {
        SlashCommand {
            declaration: Declaration::new(name),
            description: description.into(),
            action: SlashAction::Subcommands(tree),
        }
    }

    /// Declare a named option. Only meaningful for direct-run commands;
    /// subcommand trees declare options per subcommand.
    pub fn option(mut self, name: impl Into<String>, schema: OptionSchema) -> Self {
        match &mut self.action {
            SlashAction::Run(invocable) => {
                invocable.options.insert(name.into(), schema);
            }
            SlashAction::Subcommands(_) => {
                debug_assert!(false, "options belong on subcommands, not the tree root");
            }
        }
        self
    }

    pub fn pre_reply(mut self) -> Self {
        self.with_flags(|flags| flags.pre_reply = true);
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.with_flags(|flags| flags.ephemeral = true);
        self
    }

    pub fn developer_only(mut self) -> Self {
        self.with_flags(|flags| flags.developer_only = true);
        self
    }

    pub fn required_permissions(mut self, permissions: Permissions) -> Self {
        self.with_flags(|flags| flags.required_permissions = Some(permissions));
        self
    }

    fn with_flags(&mut self, apply: impl FnOnce(&mut RunFlags)) {
        match &mut self.action {
            SlashAction::Run(invocable) => apply(&mut invocable.flags),
            SlashAction::Subcommands(_) => {
                debug_assert!(false, "flags belong on subcommands, not the tree root");
            }
        }
    }

    pub fn name_localization(mut self, locale: impl Into<String>, name: impl Into<String>) -> Self {
        self.declaration
            .name_localizations
            .insert(locale.into(), name.into());
        self
    }

    pub fn default_member_permissions(mut self, permissions: Permissions) -> Self {
        self.declaration.default_member_permissions = Some(permissions);
        self
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.declaration.nsfw = Some(nsfw);
        self
    }

    pub fn contexts(mut self, contexts: Vec<InteractionContextType>) -> Self {
        self.declaration.contexts = Some(contexts);
        self
    }

    pub fn integration_types(mut self, types: Vec<IntegrationType>) -> Self {
        self.declaration.integration_types = Some(types);
        self
    }
}

/// A user- or message-command variant (context menu entries).
#[derive(Clone)]
pub struct ContextCommand {
    pub declaration: Declaration,
    pub run: Invocable,
}

impl ContextCommand {
    pub fn new(name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        ContextCommand {
            declaration: Declaration::new(name),
            run: Invocable::new(handler),
        }
    }

    pub fn pre_reply(mut self) -> Self {
        self.run.flags.pre_reply = true;
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.run.flags.ephemeral = true;
        self
    }

    pub fn developer_only(mut self) -> Self {
        self.run.flags.developer_only = true;
        self
    }

    pub fn required_permissions(mut self, permissions: Permissions) -> Self {
        self.run.flags.required_permissions = Some(permissions);
        self
    }

    pub fn default_member_permissions(mut self, permissions: Permissions) -> Self {
        self.declaration.default_member_permissions = Some(permissions);
        self
    }
}

/// One leaf subcommand.
#[derive(Clone)]
pub struct SubCommand {
    pub description: String,
    pub run: Invocable,
}

impl fmt::Debug for SubCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubCommand")
            .field("description", &self.description)
            .field("options", &self.run.options)
            .field("flags", &self.run.flags)
            .finish_non_exhaustive()
    }
}

impl SubCommand {
    pub fn new(description: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        SubCommand {
            description: description.into(),
            run: Invocable::new(handler),
        }
    }

    pub fn option(mut self, name: impl Into<String>, schema: OptionSchema) -> Self {
        self.run.options.insert(name.into(), schema);
        self
    }

    pub fn pre_reply(mut self) -> Self {
        self.run.flags.pre_reply = true;
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.run.flags.ephemeral = true;
        self
    }

    pub fn developer_only(mut self) -> Self {
        self.run.flags.developer_only = true;
        self
    }

    pub fn required_permissions(mut self, permissions: Permissions) -> Self {
        self.run.flags.required_permissions = Some(permissions);
        self
    }
}

/// A one-level-deep group of subcommands.
#[derive(Clone)]
pub struct SubCommandGroup {
    pub description: String,
    pub subcommands: BTreeMap<String, SubCommand>,
}

impl SubCommandGroup {
    pub fn new(description: impl Into<String>) -> Self {
        SubCommandGroup {
            description: description.into(),
            subcommands: BTreeMap::new(),
        }
    }

    pub fn subcommand(mut self, name: impl Into<String>, sub: SubCommand) -> Self {
        self.subcommands.insert(name.into(), sub);
        self
    }
}

#[derive(Clone)]
pub enum SubCommandNode {
    Command(SubCommand),
    Group(SubCommandGroup),
}

/// `name -> (subcommand | group)` mapping under one slash command. The wire
/// schema allows exactly two levels — the group maps straight to leaf
/// subcommands, never to another group.
#[derive(Clone, Default)]
pub struct SubCommandTree {
    nodes: BTreeMap<String, SubCommandNode>,
}

impl SubCommandTree {
    pub fn new() -> Self {
        SubCommandTree::default()
    }

    pub fn subcommand(mut self, name: impl Into<String>, sub: SubCommand) -> Self {
        self.nodes.insert(name.into(), SubCommandNode::Command(sub));
        self
    }

    pub fn group(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        build: impl FnOnce(SubCommandGroup) -> SubCommandGroup,
    ) -> Self {
        let group = build(SubCommandGroup::new(description));
        self.nodes.insert(name.into(), SubCommandNode::Group(group));
        self
    }

    pub fn nodes(&self) -> &BTreeMap<String, SubCommandNode> {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk the tree using the names an event reported. Each miss is its own
    /// case: an event with no subcommand name, an unknown group, and an
    /// unknown subcommand are distinct resolution failures.
    pub fn descend(
        &self,
        command: &str,
        group: Option<&str>,
        name: Option<&str>,
    ) -> Result<&SubCommand, ResolutionError> {
        let Some(sub_name) = name else {
            return Err(ResolutionError::MissingSubcommand {
                command: command.to_string(),
            });
        };
        match group {
            Some(group_name) => {
                let Some(SubCommandNode::Group(group)) = self.nodes.get(group_name) else {
                    return Err(ResolutionError::UnknownGroup {
                        command: command.to_string(),
                        group: group_name.to_string(),
                    });
                };
                group
                    .subcommands
                    .get(sub_name)
                    .ok_or_else(|| ResolutionError::UnknownSubcommand {
                        command: format!("{command} {group_name}"),
                        subcommand: sub_name.to_string(),
                    })
            }
            None => match self.nodes.get(sub_name) {
                Some(SubCommandNode::Command(sub)) => Ok(sub),
                _ => Err(ResolutionError::UnknownSubcommand {
                    command: command.to_string(),
                    subcommand: sub_name.to_string(),
                }),
            },
        }
    }
}

/// The complete definition of one command across its variants.
#[derive(Clone)]
pub struct CommandSpec {
    /// Diagnostic label used in load-time errors; the registered names live
    /// on the variants.
    pub label: String,
    pub slash: Option<SlashCommand>,
    pub user: Option<ContextCommand>,
    pub message: Option<ContextCommand>,
}

impl CommandSpec {
    pub fn new(label: impl Into<String>) -> Self {
        CommandSpec {
            label: label.into(),
            slash: None,
            user: None,
            message: None,
        }
    }

    pub fn slash(mut self, command: SlashCommand) -> Self {
        self.slash = Some(command);
        self
    }

    pub fn user(mut self, command: ContextCommand) -> Self {
        self.user = Some(command);
        self
    }

    pub fn message(mut self, command: ContextCommand) -> Self {
        self.message = Some(command);
        self
    }
}

/// How a component matcher compares against an incoming identifier prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherMode {
    /// The matcher must be a leading prefix of the incoming identifier
    /// (after the separator split). The default.
    Begin,
    /// The matcher must equal the incoming identifier prefix exactly.
    Full,
}

/// A component handler registration.
#[derive(Clone)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    pub matcher: String,
    pub mode: MatcherMode,
    pub author_only: bool,
    pub flags: RunFlags,
    pub handler: Arc<dyn Handler>,
}

impl ComponentSpec {
    fn new(kind: ComponentKind, matcher: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        ComponentSpec {
            kind,
            matcher: matcher.into(),
            mode: MatcherMode::Begin,
            author_only: false,
            flags: RunFlags::default(),
            handler,
        }
    }

    pub fn button(matcher: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self::new(ComponentKind::Button, matcher, handler)
    }

    pub fn select_menu(matcher: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self::new(ComponentKind::SelectMenu, matcher, handler)
    }

    pub fn modal(matcher: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self::new(ComponentKind::Modal, matcher, handler)
    }

    pub fn full_match(mut self) -> Self {
        self.mode = MatcherMode::Full;
        self
    }

    pub fn author_only(mut self) -> Self {
        self.author_only = true;
        self
    }

    pub fn pre_reply(mut self) -> Self {
        self.flags.pre_reply = true;
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.flags.ephemeral = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NoopHandler;

    fn sample_tree() -> SubCommandTree {
        SubCommandTree::new()
            .subcommand("status", SubCommand::new("Show status", Arc::new(NoopHandler)))
            .group("entry", "Manage entries", |group| {
                group.subcommand("add", SubCommand::new("Add an entry", Arc::new(NoopHandler)))
            })
    }

    #[test]
    fn test_descend_direct_subcommand() {
        let tree = sample_tree();
        let sub = tree.descend("registry", None, Some("status")).unwrap();
        assert_eq!(sub.description, "Show status");
    }

    #[test]
    fn test_descend_through_group() {
        let tree = sample_tree();
        let sub = tree.descend("registry", Some("entry"), Some("add")).unwrap();
        assert_eq!(sub.description, "Add an entry");
    }

    #[test]
    fn test_descend_missing_subcommand_name() {
        let tree = sample_tree();
        let err = tree.descend("registry", None, None).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::MissingSubcommand {
                command: "registry".to_string()
            }
        );
    }

    #[test]
    fn test_descend_unknown_group_named_distinctly() {
        let tree = sample_tree();
        let err = tree
            .descend("registry", Some("component"), Some("button"))
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::UnknownGroup {
                command: "registry".to_string(),
                group: "component".to_string()
            }
        );
    }

    #[test]
    fn test_descend_unknown_subcommand() {
        let tree = sample_tree();
        let err = tree.descend("registry", None, Some("missing")).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::UnknownSubcommand {
                command: "registry".to_string(),
                subcommand: "missing".to_string()
            }
        );

        let err = tree
            .descend("registry", Some("entry"), Some("missing"))
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::UnknownSubcommand {
                command: "registry entry".to_string(),
                subcommand: "missing".to_string()
            }
        );
    }

    #[test]
    fn test_descend_group_name_is_not_a_subcommand() {
        // Using a group name where a subcommand is expected must not resolve.
        let tree = sample_tree();
        let err = tree.descend("registry", None, Some("entry")).unwrap_err();
        assert!(matches!(err, ResolutionError::UnknownSubcommand { .. }));
    }

    #[test]
    fn test_command_kind_codes_round_trip() {
        for kind in [CommandKind::Slash, CommandKind::User, CommandKind::Message] {
            assert_eq!(CommandKind::from_wire_code(kind.wire_code()), Some(kind));
        }
        assert_eq!(CommandKind::from_wire_code(9), None);
    }

    #[test]
    fn test_scope_key_prefix() {
        assert_eq!(CommandScope::Global.key_prefix(), "");
        assert_eq!(CommandScope::Guild("123".to_string()).key_prefix(), "guild:");
    }
}
