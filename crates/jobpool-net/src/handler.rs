//! Session handler and factory traits
//!
//! The pool only knows [`SessionRouter`]; each session carries its own
//! [`SessionHandler`], resolved once from a [`HandlerFactory`] when the
//! connection is accepted.

use std::marker::PhantomData;
use std::sync::Arc;

use jobpool_core::{JobHandler, JobResult};

use crate::session::Session;

/// Read/write behaviour for one session
///
/// Return `Ok(false)` to take the session out of circulation. Handlers move
/// the phase themselves: typically `NeedsWrite` after a read with data and
/// `NeedsRead` after answering.
pub trait SessionHandler: Send + Sync + 'static {
    fn on_read(&self, session: &mut Session) -> JobResult<bool>;

    fn on_write(&self, session: &mut Session) -> JobResult<bool>;

    /// Preferred buffer size, consulted once when the session is created
    fn buffer_size(&self) -> Option<usize> {
        None
    }
}

/// Source of handlers, called once per accepted connection
pub trait HandlerFactory: Send + Sync + 'static {
    fn create(&self) -> Arc<dyn SessionHandler>;
}

/// A fresh `H::default()` for every session
pub struct PerSessionFactory<H> {
    _marker: PhantomData<fn() -> H>,
}

impl<H> PerSessionFactory<H> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<H> Default for PerSessionFactory<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: SessionHandler + Default> HandlerFactory for PerSessionFactory<H> {
    fn create(&self) -> Arc<dyn SessionHandler> {
        Arc::new(H::default())
    }
}

/// One handler instance shared by every session
pub struct SharedFactory {
    handler: Arc<dyn SessionHandler>,
}

impl SharedFactory {
    pub fn new<H: SessionHandler>(handler: H) -> Self {
        Self { handler: Arc::new(handler) }
    }
}

impl HandlerFactory for SharedFactory {
    fn create(&self) -> Arc<dyn SessionHandler> {
        Arc::clone(&self.handler)
    }
}

/// Factory from a closure
pub struct FnFactory<F>(pub F);

impl<F> HandlerFactory for FnFactory<F>
where
    F: Fn() -> Arc<dyn SessionHandler> + Send + Sync + 'static,
{
    fn create(&self) -> Arc<dyn SessionHandler> {
        (self.0)()
    }
}

/// Pool-level handler: forwards each call to the session's own handler
pub struct SessionRouter;

impl JobHandler<Session> for SessionRouter {
    fn on_read(&self, session: &mut Session) -> JobResult<bool> {
        session.handler().on_read(session)
    }

    fn on_write(&self, session: &mut Session) -> JobResult<bool> {
        session.handler().on_write(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{connected, Inert};
    use jobpool_core::{Job, Phase};

    #[derive(Default)]
    struct Flip;

    impl SessionHandler for Flip {
        fn on_read(&self, session: &mut Session) -> JobResult<bool> {
            session.set_phase(Phase::NeedsWrite);
            Ok(true)
        }
        fn on_write(&self, session: &mut Session) -> JobResult<bool> {
            session.set_phase(Phase::Closed);
            Ok(false)
        }
    }

    #[test]
    fn test_per_session_factory_makes_new_handlers() {
        let factory = PerSessionFactory::<Flip>::new();
        assert!(!Arc::ptr_eq(&factory.create(), &factory.create()));
    }

    #[test]
    fn test_shared_factory_reuses_handler() {
        let factory = SharedFactory::new(Inert(Some(32)));
        let (a, b) = (factory.create(), factory.create());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.buffer_size(), Some(32));
    }

    #[test]
    fn test_router_uses_session_handler() {
        let factory = FnFactory(|| Arc::new(Flip) as Arc<dyn SessionHandler>);
        let (mut session, _client) = connected(factory.create(), 16);

        assert!(SessionRouter.on_read(&mut session).unwrap());
        assert_eq!(session.phase(), Phase::NeedsWrite);
        assert!(!SessionRouter.on_write(&mut session).unwrap());
        assert_eq!(session.phase(), Phase::Closed);
    }
}
