//! Per-user cooldown middleware.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.2.0
//!
//! ## Changelog
//! - 1.1.0: Single-entry check-then-set to keep concurrent dispatches honest
//! - 1.0.0: Initial per-user window
//!
//! Tracks the last accepted invocation per user id in a `DashMap`. The
//! check-then-set happens inside one map entry access with no suspension
//! point in between: two concurrent dispatches for the same user cannot both
//! pass the check.

use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;

use crate::context::DispatchContext;
use crate::middleware::{Middleware, MiddlewareResult};
use crate::outcome::Outcome;
use crate::transport::ReplyPayload;

pub struct Cooldown {
    window: Duration,
    message: String,
    last_accepted: DashMap<String, Instant>,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Cooldown {
            window,
            message: "You're doing that too quickly. Please wait a moment.".to_string(),
            last_accepted: DashMap::new(),
        }
    }

    pub fn with_message(window: Duration, message: impl Into<String>) -> Self {
        Cooldown {
            window,
            message: message.into(),
            last_accepted: DashMap::new(),
        }
    }

    /// Returns the remaining cooldown if the user is still inside the
    /// window, stamping the current instant otherwise. Synchronous on
    /// purpose: the read and the write must not be split by an await.
    fn check_and_stamp(&self, user_id: &str, now: Instant) -> Option<Duration> {
        match self.last_accepted.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let elapsed = now.duration_since(*entry.get());
                if elapsed < self.window {
                    Some(self.window - elapsed)
                } else {
                    *entry.get_mut() = now;
                    None
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                None
            }
        }
    }
}

#[async_trait]
impl Middleware for Cooldown {
    fn name(&self) -> &'static str {
        "cooldown"
    }

    async fn run(&self, ctx: &DispatchContext) -> Result<MiddlewareResult> {
        let user_id = &ctx.user().id;
        if let Some(remaining) = self.check_and_stamp(user_id, Instant::now()) {
            debug!(
                "[{}] cooldown active for user {user_id} ({}ms remaining)",
                ctx.request_id(),
                remaining.as_millis()
            );
            ctx.reply(&ReplyPayload::text(self.message.clone()).ephemeral())
                .await?;
            return Ok(MiddlewareResult::cancel(Outcome::status("cooldown")));
        }
        Ok(MiddlewareResult::pass())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::InteractionEvent;
    use crate::testing::{test_command_event, test_transport};
    use uuid::Uuid;

    fn test_ctx() -> DispatchContext {
        DispatchContext::new(
            InteractionEvent::Command(test_command_event("ping")),
            test_transport(),
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_first_use_passes_and_stamps() {
        let cooldown = Cooldown::new(Duration::from_secs(10));
        let now = Instant::now();
        assert!(cooldown.check_and_stamp("user1", now).is_none());
        assert!(cooldown.check_and_stamp("user1", now).is_some());
    }

    #[test]
    fn test_window_expiry_allows_again() {
        let cooldown = Cooldown::new(Duration::from_millis(50));
        let start = Instant::now();
        assert!(cooldown.check_and_stamp("user1", start).is_none());
        assert!(cooldown
            .check_and_stamp("user1", start + Duration::from_millis(10))
            .is_some());
        assert!(cooldown
            .check_and_stamp("user1", start + Duration::from_millis(60))
            .is_none());
    }

    #[test]
    fn test_users_tracked_independently() {
        let cooldown = Cooldown::new(Duration::from_secs(10));
        let now = Instant::now();
        assert!(cooldown.check_and_stamp("user1", now).is_none());
        assert!(cooldown.check_and_stamp("user2", now).is_none());
        assert!(cooldown.check_and_stamp("user1", now).is_some());
    }

    #[tokio::test]
    async fn test_cancel_replies_and_reports_cooldown() {
        let cooldown = Cooldown::new(Duration::from_secs(10));
        let transport = test_transport();
        let ctx = DispatchContext::new(
            InteractionEvent::Command(test_command_event("ping")),
            transport.clone(),
            Uuid::new_v4(),
        );

        // First run passes.
        match cooldown.run(&ctx).await.unwrap() {
            MiddlewareResult::Next(_) => {}
            MiddlewareResult::Cancel(_) => panic!("first use must pass"),
        }

        // Second run inside the window cancels and tells the user.
        match cooldown.run(&ctx).await.unwrap() {
            MiddlewareResult::Cancel(outcome) => assert!(outcome.is_success()),
            MiddlewareResult::Next(_) => panic!("second use must cancel"),
        }
        assert_eq!(transport.replies().len(), 1);
        assert!(transport.last_reply_payload().unwrap().ephemeral);
    }

    #[tokio::test]
    async fn test_passing_run_contributes_unit() {
        let cooldown = Cooldown::new(Duration::from_secs(10));
        let ctx = test_ctx();
        match cooldown.run(&ctx).await.unwrap() {
            MiddlewareResult::Next(_) => {}
            MiddlewareResult::Cancel(_) => panic!("expected pass"),
        }
    }
}
