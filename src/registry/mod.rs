// Registries are instance-owned with explicit lifecycle: populated while
// loading/resolving at startup, cleared on shutdown or reconnect. Never
// module-level singletons, so dispatch stays testable in isolation.

pub mod commands;
pub mod components;

pub use commands::{command_key, CommandEntry, CommandRegistry, RegisteredCommand};
pub use components::{ComponentEntry, ComponentRegistry, CUSTOM_ID_LIMIT, MATCHER_SEPARATOR};
