// Model layer - definitions, entities, events, options, wire schema
pub mod model;

// Dispatch core
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod middleware;
pub mod outcome;
pub mod registry;
pub mod transport;
pub mod validate;

// Shared mocks for the inline test suites
#[cfg(test)]
pub(crate) mod testing;

// Re-export the surface most embedders touch
pub use config::DispatcherConfig;
pub use context::{Additional, DispatchContext};
pub use dispatch::{DefaultResultHandler, DispatchReport, Dispatcher, ResultHandler};
pub use error::{LoadError, ResolutionError};
pub use middleware::{Cooldown, Middleware, MiddlewareResult, Pipeline};
pub use outcome::{Failure, Outcome, Success};
pub use transport::{
    ConfirmedCommand, DeferOptions, EntityKind, GuildEntity, ReplyPayload, Transport,
};
pub use validate::{OptionValidator, ValidationErrorKind, ValidationFailure};

// Re-export model items for flat access
pub use model::definition::{
    CommandKind, CommandScope, CommandSpec, ComponentSpec, ContextCommand, Declaration, Handler,
    Invocable, MatcherMode, RunFlags, SlashAction, SlashCommand, SubCommand, SubCommandGroup,
    SubCommandNode, SubCommandTree,
};
pub use model::entity::{Attachment, Channel, Member, Role, User};
pub use model::event::{
    CommandEvent, ComponentEvent, ComponentKind, EntityRef, EventRef, InteractionEvent,
    MentionablePayload, ModalEvent, RawOptionValue,
};
pub use model::options::{
    Choice, ChoiceValue, Mention, OptionSchema, OptionType, OptionValue, ResolvedOptions,
};
pub use model::wire::{
    to_wire, IntegrationType, InteractionContextType, Permissions, WireChoice, WireCommand,
    WireOption,
};
