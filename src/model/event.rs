//! Inbound interaction events.
//!
//! One tagged union covers all interaction kinds the transport delivers.
//! Each event carries the opaque [`EventRef`] the transport needs to route
//! replies back to the originating interaction.

use std::collections::HashMap;
use std::fmt;

use crate::model::definition::{CommandKind, CommandScope};
use crate::model::entity::{Attachment, Channel, Member, Role, User};
use crate::model::wire::Permissions;

/// Opaque handle identifying one interaction for reply routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRef {
    pub id: String,
    pub token: String,
}

impl EventRef {
    pub fn new(id: impl Into<String>, token: impl Into<String>) -> Self {
        EventRef {
            id: id.into(),
            token: token.into(),
        }
    }
}

/// A reference-typed option as it arrives on the wire: either already
/// resolved by the remote, or a bare identifier to fetch lazily.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRef<T> {
    Resolved(T),
    Id(String),
}

/// A mentionable option payload. The remote resolves it to one of these
/// shapes before delivery; members are unwrapped to their user during
/// validation.
#[derive(Debug, Clone, PartialEq)]
pub enum MentionablePayload {
    Role(Role),
    User(User),
    Member(Member),
}

/// Raw per-option value as reported by the event, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(User),
    Channel(EntityRef<Channel>),
    Role(EntityRef<Role>),
    Mentionable(MentionablePayload),
    Attachment(Attachment),
}

/// The component registries a handler can be registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Button,
    SelectMenu,
    Modal,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Button => write!(f, "button"),
            ComponentKind::SelectMenu => write!(f, "select menu"),
            ComponentKind::Modal => write!(f, "modal"),
        }
    }
}

/// A command invocation (slash, user, or message command).
#[derive(Debug, Clone)]
pub struct CommandEvent {
    pub event_ref: EventRef,
    /// Remote-assigned identifier of the invoked command.
    pub command_id: String,
    pub name: String,
    pub kind: CommandKind,
    /// Scope the command was registered under, as reported by the transport.
    pub scope: CommandScope,
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub user: User,
    /// Permissions the invoking member holds in the channel, when known.
    pub member_permissions: Option<Permissions>,
    pub subcommand_group: Option<String>,
    pub subcommand: Option<String>,
    pub options: HashMap<String, RawOptionValue>,
    /// Target entity id for user/message commands.
    pub target_id: Option<String>,
}

/// A button click or select-menu choice.
#[derive(Debug, Clone)]
pub struct ComponentEvent {
    pub event_ref: EventRef,
    pub kind: ComponentKind,
    pub custom_id: String,
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub user: User,
    pub member_permissions: Option<Permissions>,
    /// User that opened the interaction the component is attached to,
    /// when the transport reports it.
    pub invoker_id: Option<String>,
    /// Selected values (select menus only).
    pub values: Vec<String>,
}

/// A modal submission.
#[derive(Debug, Clone)]
pub struct ModalEvent {
    pub event_ref: EventRef,
    pub custom_id: String,
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub user: User,
    pub member_permissions: Option<Permissions>,
    /// Submitted field values keyed by field identifier.
    pub fields: HashMap<String, String>,
}

/// One inbound interaction, in whichever shape the transport delivered it.
#[derive(Debug, Clone)]
pub enum InteractionEvent {
    Command(CommandEvent),
    Component(ComponentEvent),
    Modal(ModalEvent),
}

impl InteractionEvent {
    pub fn event_ref(&self) -> &EventRef {
        match self {
            InteractionEvent::Command(ev) => &ev.event_ref,
            InteractionEvent::Component(ev) => &ev.event_ref,
            InteractionEvent::Modal(ev) => &ev.event_ref,
        }
    }

    pub fn user(&self) -> &User {
        match self {
            InteractionEvent::Command(ev) => &ev.user,
            InteractionEvent::Component(ev) => &ev.user,
            InteractionEvent::Modal(ev) => &ev.user,
        }
    }

    pub fn guild_id(&self) -> Option<&str> {
        match self {
            InteractionEvent::Command(ev) => ev.guild_id.as_deref(),
            InteractionEvent::Component(ev) => ev.guild_id.as_deref(),
            InteractionEvent::Modal(ev) => ev.guild_id.as_deref(),
        }
    }

    pub fn channel_id(&self) -> &str {
        match self {
            InteractionEvent::Command(ev) => &ev.channel_id,
            InteractionEvent::Component(ev) => &ev.channel_id,
            InteractionEvent::Modal(ev) => &ev.channel_id,
        }
    }

    pub fn member_permissions(&self) -> Option<Permissions> {
        match self {
            InteractionEvent::Command(ev) => ev.member_permissions,
            InteractionEvent::Component(ev) => ev.member_permissions,
            InteractionEvent::Modal(ev) => ev.member_permissions,
        }
    }

    /// Short human-readable label for log lines.
    pub fn label(&self) -> String {
        match self {
            InteractionEvent::Command(ev) => format!("command `{}`", ev.name),
            InteractionEvent::Component(ev) => format!("{} `{}`", ev.kind, ev.custom_id),
            InteractionEvent::Modal(ev) => format!("modal `{}`", ev.custom_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: "100".to_string(),
            username: "tester".to_string(),
            bot: false,
        }
    }

    #[test]
    fn test_event_accessors() {
        let event = InteractionEvent::Component(ComponentEvent {
            event_ref: EventRef::new("1", "tok"),
            kind: ComponentKind::Button,
            custom_id: "confirm:42".to_string(),
            guild_id: Some("555".to_string()),
            channel_id: "9".to_string(),
            user: test_user(),
            member_permissions: None,
            invoker_id: None,
            values: Vec::new(),
        });

        assert_eq!(event.guild_id(), Some("555"));
        assert_eq!(event.user().id, "100");
        assert_eq!(event.label(), "button `confirm:42`");
    }
}
