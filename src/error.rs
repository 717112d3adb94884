//! Typed errors for the load and resolution stages.
//!
//! Everything past the resolution stage funnels through the dispatch outcome
//! channel instead (see `outcome`); these enums cover the two stages where a
//! typed taxonomy is part of the contract: configuration errors caught while
//! loading definitions, and resolution misses that drop an event.

use thiserror::Error;

use crate::model::event::ComponentKind;

/// Malformed handler definitions, detected at load time. Fatal to the load
/// call, never to already-running dispatches.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("command `{name}` declares none of slash, user, or message")]
    EmptyDefinition { name: String },

    #[error("option `{option}` on `{command}` declares both choices and autocomplete")]
    ChoicesWithAutocomplete { command: String, option: String },

    #[error("component matcher must not be empty")]
    EmptyMatcher,

    #[error("matcher `{matcher}` contains the reserved separator `{separator}`")]
    MatcherContainsSeparator {
        matcher: String,
        separator: &'static str,
    },

    #[error("matcher `{matcher}` is {len} characters; identifiers are limited to {limit}")]
    MatcherTooLong {
        matcher: String,
        len: usize,
        limit: usize,
    },

    #[error("a {kind} handler with matcher `{matcher}` is already registered")]
    DuplicateMatcher {
        kind: ComponentKind,
        matcher: String,
    },
}

/// An incoming event referenced something no local handler is registered
/// for. Logged and dropped without a user reply — there is no handler to
/// attribute a response to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("no handler registered under key `{key}`")]
    UnknownCommand { key: String },

    #[error("event for `{command}` names no subcommand")]
    MissingSubcommand { command: String },

    #[error("`{command}` has no subcommand group `{group}`")]
    UnknownGroup { command: String, group: String },

    #[error("`{command}` has no subcommand `{subcommand}`")]
    UnknownSubcommand { command: String, subcommand: String },

    #[error("no {kind} handler matches identifier `{custom_id}`")]
    UnknownComponent {
        kind: ComponentKind,
        custom_id: String,
    },
}
