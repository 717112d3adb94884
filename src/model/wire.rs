//! Declarative wire schema pushed to the remote.
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Contexts and integration types on the base command payload
//! - 1.1.0: Nested subcommand/group options
//! - 1.0.0: Initial schema shapes
//!
//! Enumeration-valued fields (permission flags, context flags, integration
//! types, option type codes) translate through the fixed tables below. The
//! transform itself ([`to_wire`]) is pure and synchronous; its only failure
//! modes are malformed definitions, rejected at load time.

use std::collections::BTreeMap;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::model::definition::{
    CommandKind, CommandSpec, ContextCommand, Declaration, SlashAction, SlashCommand, SubCommand,
    SubCommandNode, SubCommandTree,
};
use crate::model::options::{Choice, ChoiceValue, OptionSchema};

/// Wire code for a subcommand option entry.
pub const SUB_COMMAND: u8 = 1;
/// Wire code for a subcommand-group option entry.
pub const SUB_COMMAND_GROUP: u8 = 2;

/// Permission bitfield as the wire format defines it.
///
/// Only the flags this crate's callers actually gate on are named; the
/// newtype accepts any raw bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const KICK_MEMBERS: Permissions = Permissions(1 << 1);
    pub const BAN_MEMBERS: Permissions = Permissions(1 << 2);
    pub const ADMINISTRATOR: Permissions = Permissions(1 << 3);
    pub const MANAGE_CHANNELS: Permissions = Permissions(1 << 4);
    pub const MANAGE_GUILD: Permissions = Permissions(1 << 5);
    pub const MANAGE_MESSAGES: Permissions = Permissions(1 << 13);
    pub const MENTION_EVERYONE: Permissions = Permissions(1 << 17);
    pub const MANAGE_ROLES: Permissions = Permissions(1 << 28);
    pub const MODERATE_MEMBERS: Permissions = Permissions(1 << 40);

    pub fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Decimal string encoding the remote expects for permission fields.
    pub fn to_wire(self) -> String {
        self.0.to_string()
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Permissions) -> Permissions {
        Permissions(self.0 | rhs.0)
    }
}

/// Where a command may be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionContextType {
    Guild,
    BotDm,
    PrivateChannel,
}

impl InteractionContextType {
    pub fn wire_code(self) -> u8 {
        match self {
            InteractionContextType::Guild => 0,
            InteractionContextType::BotDm => 1,
            InteractionContextType::PrivateChannel => 2,
        }
    }
}

/// How the application owning a command was installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationType {
    GuildInstall,
    UserInstall,
}

impl IntegrationType {
    pub fn wire_code(self) -> u8 {
        match self {
            IntegrationType::GuildInstall => 0,
            IntegrationType::UserInstall => 1,
        }
    }
}

/// One command schema as the remote's declarative JSON expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCommand {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_localizations: Option<BTreeMap<String, String>>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_types: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<WireOption>>,
}

/// One option entry, including nested subcommand/group entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireOption {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<WireChoice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_types: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<WireOption>>,
}

impl WireOption {
    fn bare(kind: u8, name: &str, description: &str) -> Self {
        WireOption {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            required: None,
            choices: None,
            autocomplete: None,
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
            channel_types: None,
            options: None,
        }
    }
}

/// Choice values are heterogeneously string/int/float on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireChoice {
    pub name: String,
    pub value: serde_json::Value,
}

/// Transform one local definition into the wire schemas to push: one per
/// declared variant.
///
/// Validates the at-least-one-variant invariant and the choices/autocomplete
/// exclusion, recursively through subcommand trees.
pub fn to_wire(spec: &CommandSpec) -> Result<Vec<WireCommand>, LoadError> {
    let mut out = Vec::new();
    if let Some(slash) = &spec.slash {
        out.push(slash_to_wire(slash)?);
    }
    if let Some(user) = &spec.user {
        out.push(context_to_wire(user, CommandKind::User));
    }
    if let Some(message) = &spec.message {
        out.push(context_to_wire(message, CommandKind::Message));
    }
    if out.is_empty() {
        return Err(LoadError::EmptyDefinition {
            name: spec.label.clone(),
        });
    }
    Ok(out)
}

fn base_wire(decl: &Declaration, kind: CommandKind, description: String) -> WireCommand {
    WireCommand {
        kind: kind.wire_code(),
        name: decl.name.clone(),
        name_localizations: if decl.name_localizations.is_empty() {
            None
        } else {
            Some(decl.name_localizations.clone())
        },
        description,
        default_member_permissions: decl.default_member_permissions.map(Permissions::to_wire),
        nsfw: decl.nsfw,
        contexts: decl
            .contexts
            .as_ref()
            .map(|cs| cs.iter().map(|c| c.wire_code()).collect()),
        integration_types: decl
            .integration_types
            .as_ref()
            .map(|ts| ts.iter().map(|t| t.wire_code()).collect()),
        options: None,
    }
}

fn slash_to_wire(cmd: &SlashCommand) -> Result<WireCommand, LoadError> {
    let mut wire = base_wire(&cmd.declaration, CommandKind::Slash, cmd.description.clone());
    let options = match &cmd.action {
        SlashAction::Run(invocable) => options_to_wire(&cmd.declaration.name, &invocable.options)?,
        SlashAction::Subcommands(tree) => tree_to_wire(&cmd.declaration.name, tree)?,
    };
    if !options.is_empty() {
        wire.options = Some(options);
    }
    Ok(wire)
}

fn context_to_wire(cmd: &ContextCommand, kind: CommandKind) -> WireCommand {
    // Context commands carry no description on this wire; the field is
    // present but empty.
    base_wire(&cmd.declaration, kind, String::new())
}

fn options_to_wire(
    command: &str,
    options: &BTreeMap<String, OptionSchema>,
) -> Result<Vec<WireOption>, LoadError> {
    options
        .iter()
        .map(|(name, schema)| option_to_wire(command, name, schema))
        .collect()
}

fn option_to_wire(command: &str, name: &str, schema: &OptionSchema) -> Result<WireOption, LoadError> {
    if !schema.choices.is_empty() && schema.autocomplete {
        return Err(LoadError::ChoicesWithAutocomplete {
            command: command.to_string(),
            option: name.to_string(),
        });
    }
    let mut wire = WireOption::bare(schema.kind.wire_code(), name, &schema.description);
    wire.required = schema.required.then_some(true);
    wire.autocomplete = schema.autocomplete.then_some(true);
    wire.min_value = schema.min_value;
    wire.max_value = schema.max_value;
    wire.min_length = schema.min_length;
    wire.max_length = schema.max_length;
    if !schema.choices.is_empty() {
        wire.choices = Some(schema.choices.iter().map(choice_to_wire).collect());
    }
    if !schema.channel_types.is_empty() {
        wire.channel_types = Some(schema.channel_types.clone());
    }
    Ok(wire)
}

fn choice_to_wire(choice: &Choice) -> WireChoice {
    let value = match &choice.value {
        ChoiceValue::String(s) => serde_json::Value::from(s.clone()),
        ChoiceValue::Integer(i) => serde_json::Value::from(*i),
        ChoiceValue::Number(n) => serde_json::Value::from(*n),
    };
    WireChoice {
        name: choice.name.clone(),
        value,
    }
}

fn tree_to_wire(command: &str, tree: &SubCommandTree) -> Result<Vec<WireOption>, LoadError> {
    tree.nodes()
        .iter()
        .map(|(name, node)| match node {
            SubCommandNode::Command(sub) => subcommand_to_wire(command, name, sub),
            SubCommandNode::Group(group) => {
                let nested = group
                    .subcommands
                    .iter()
                    .map(|(sub_name, sub)| subcommand_to_wire(command, sub_name, sub))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut wire = WireOption::bare(SUB_COMMAND_GROUP, name, &group.description);
                wire.options = Some(nested);
                Ok(wire)
            }
        })
        .collect()
}

fn subcommand_to_wire(command: &str, name: &str, sub: &SubCommand) -> Result<WireOption, LoadError> {
    let options = options_to_wire(command, &sub.run.options)?;
    let mut wire = WireOption::bare(SUB_COMMAND, name, &sub.description);
    if !options.is_empty() {
        wire.options = Some(options);
    }
    Ok(wire)
}
