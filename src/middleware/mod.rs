//! Composable pre-handler middleware.
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.2.0
//!
//! ## Changelog
//! - 2.0.0: Heterogeneous contribution bag keyed by middleware name
//! - 1.0.0: Initial sequential chain
//!
//! Middleware run strictly in the order supplied, each seeing the
//! contributions of all earlier ones through the context's additional bag.
//! A cancelling middleware produces the dispatch's final outcome; nothing
//! after it — later middleware or the handler — ever runs.

pub mod cooldown;

pub use cooldown::Cooldown;

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::context::DispatchContext;
use crate::outcome::Outcome;

/// What one middleware decided: continue with a contribution, or stop with
/// the dispatch's final outcome. Exactly one of the two, by construction.
pub enum MiddlewareResult {
    Next(Box<dyn Any + Send + Sync>),
    Cancel(Outcome),
}

impl MiddlewareResult {
    /// Continue, contributing `value` to the additional bag under this
    /// middleware's name.
    pub fn next<T: Send + Sync + 'static>(value: T) -> Self {
        MiddlewareResult::Next(Box::new(value))
    }

    /// Continue without a meaningful contribution.
    pub fn pass() -> Self {
        MiddlewareResult::Next(Box::new(()))
    }

    pub fn cancel(outcome: Outcome) -> Self {
        MiddlewareResult::Cancel(outcome)
    }
}

#[async_trait]
pub trait Middleware: Send + Sync {
    /// Key this middleware's contribution is stored under.
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &DispatchContext) -> Result<MiddlewareResult>;
}

/// An ordered middleware chain.
#[derive(Clone, Default)]
pub struct Pipeline {
    chain: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.chain.push(middleware);
    }

    pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.chain.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Run the chain in order. Returns `Some(outcome)` when a middleware
    /// cancelled; `None` when the whole chain passed and the handler may
    /// run. Errors from middleware bodies propagate for the caller to
    /// normalize like handler errors.
    pub async fn run(&self, ctx: &mut DispatchContext) -> Result<Option<Outcome>> {
        for middleware in &self.chain {
            match middleware.run(&*ctx).await? {
                MiddlewareResult::Next(contribution) => {
                    ctx.additional_mut().insert(middleware.name(), contribution);
                }
                MiddlewareResult::Cancel(outcome) => {
                    debug!(
                        "[{}] middleware `{}` cancelled the dispatch",
                        ctx.request_id(),
                        middleware.name()
                    );
                    return Ok(Some(outcome));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::InteractionEvent;
    use crate::testing::{test_command_event, test_transport};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct Contributing {
        name: &'static str,
        value: u64,
        calls: Arc<AtomicUsize>,
        /// Names this middleware expects to already be present when it runs.
        expects: Vec<&'static str>,
        /// Names this middleware expects NOT to be present yet.
        expects_absent: Vec<&'static str>,
    }

    #[async_trait]
    impl Middleware for Contributing {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, ctx: &DispatchContext) -> Result<MiddlewareResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for name in &self.expects {
                assert!(
                    ctx.additional().contains(name),
                    "`{}` expected `{name}` to have contributed already",
                    self.name
                );
            }
            for name in &self.expects_absent {
                assert!(
                    !ctx.additional().contains(name),
                    "`{}` saw `{name}` contribute too early",
                    self.name
                );
            }
            Ok(MiddlewareResult::next(self.value))
        }
    }

    struct Cancelling {
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Middleware for Cancelling {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, _ctx: &DispatchContext) -> Result<MiddlewareResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(MiddlewareResult::cancel(Outcome::status("cancelled")))
        }
    }

    fn test_ctx() -> DispatchContext {
        DispatchContext::new(
            InteractionEvent::Command(test_command_event("ping")),
            test_transport(),
            Uuid::new_v4(),
        )
    }

    #[tokio::test]
    async fn test_middleware_run_in_order_and_see_earlier_contributions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with(Arc::new(Contributing {
                name: "m1",
                value: 1,
                calls: calls.clone(),
                expects: vec![],
                expects_absent: vec!["m2", "m3"],
            }))
            .with(Arc::new(Contributing {
                name: "m2",
                value: 2,
                calls: calls.clone(),
                expects: vec!["m1"],
                expects_absent: vec!["m3"],
            }))
            .with(Arc::new(Contributing {
                name: "m3",
                value: 3,
                calls: calls.clone(),
                expects: vec!["m1", "m2"],
                expects_absent: vec![],
            }));

        let mut ctx = test_ctx();
        let cancelled = pipeline.run(&mut ctx).await.unwrap();
        assert!(cancelled.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(ctx.additional().get::<u64>("m1"), Some(&1));
        assert_eq!(ctx.additional().get::<u64>("m2"), Some(&2));
        assert_eq!(ctx.additional().get::<u64>("m3"), Some(&3));
    }

    #[tokio::test]
    async fn test_cancel_short_circuits_later_middleware() {
        let first_calls = Arc::new(AtomicUsize::new(0));
        let cancel_calls = Arc::new(AtomicUsize::new(0));
        let last_calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with(Arc::new(Contributing {
                name: "auth",
                value: 7,
                calls: first_calls.clone(),
                expects: vec![],
                expects_absent: vec![],
            }))
            .with(Arc::new(Cancelling {
                name: "cooldown",
                calls: cancel_calls.clone(),
            }))
            .with(Arc::new(Contributing {
                name: "logging",
                value: 9,
                calls: last_calls.clone(),
                expects: vec![],
                expects_absent: vec![],
            }));

        let mut ctx = test_ctx();
        let outcome = pipeline.run(&mut ctx).await.unwrap().unwrap();

        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cancel_calls.load(Ordering::SeqCst), 1);
        assert_eq!(last_calls.load(Ordering::SeqCst), 0, "logging ran after cancel");
        match outcome {
            Outcome::Success(crate::outcome::Success::Status(status)) => {
                assert_eq!(status, "cancelled")
            }
            other => panic!("expected the cancel payload, got {other:?}"),
        }
        // The cancelling middleware contributes nothing.
        assert!(!ctx.additional().contains("cooldown"));
    }

    #[tokio::test]
    async fn test_middleware_error_propagates() {
        struct Exploding;

        #[async_trait]
        impl Middleware for Exploding {
            fn name(&self) -> &'static str {
                "exploding"
            }

            async fn run(&self, _ctx: &DispatchContext) -> Result<MiddlewareResult> {
                Err(anyhow::anyhow!("middleware blew up"))
            }
        }

        let pipeline = Pipeline::new().with(Arc::new(Exploding));
        let mut ctx = test_ctx();
        let err = pipeline.run(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("blew up"));
    }
}
