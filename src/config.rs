//! Dispatcher configuration.
//!
//! One plain struct handed down at construction. The user-facing strings
//! here are the only copy the core ever sends on its own; handler replies
//! are entirely the handlers' business.

use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// User ids allowed through `developer_only` gates.
    pub developers: HashSet<String>,
    /// Sent when a permission or developer gate denies the dispatch.
    pub denial_message: String,
    /// Generic internal-error reply. Never carries internal detail; the
    /// correlation id is appended for support lookups.
    pub error_message: String,
    /// Sent when an author-restricted component is used by someone else.
    pub author_only_message: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            developers: HashSet::new(),
            denial_message: "You don't have permission to use this command.".to_string(),
            error_message: "Something went wrong while handling this interaction.".to_string(),
            author_only_message: "Only the user who opened this interaction can use it."
                .to_string(),
        }
    }
}

impl DispatcherConfig {
    pub fn developer(mut self, user_id: impl Into<String>) -> Self {
        self.developers.insert(user_id.into());
        self
    }

    pub fn denial_message(mut self, message: impl Into<String>) -> Self {
        self.denial_message = message.into();
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    pub fn author_only_message(mut self, message: impl Into<String>) -> Self {
        self.author_only_message = message.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_accumulates_developers() {
        let config = DispatcherConfig::default()
            .developer("100")
            .developer("200")
            .denial_message("nope");
        assert!(config.developers.contains("100"));
        assert!(config.developers.contains("200"));
        assert_eq!(config.denial_message, "nope");
    }
}
