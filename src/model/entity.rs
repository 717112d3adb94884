//! Entity shapes handed over by the transport.
//!
//! Identifiers are strings throughout: the transport stringifies its numeric
//! ids at the boundary and the core never does arithmetic on them.

/// A user as delivered inside an interaction payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub bot: bool,
}

/// A guild member wrapping a user.
///
/// Partial member payloads may omit the embedded user entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: Option<User>,
    pub nick: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// Transport channel-type code (text, voice, thread, ...).
    pub kind: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub size: u64,
    pub url: String,
}
