//! Live-session registry
//!
//! The server records a weak handle to every session it accepts. Sessions
//! themselves are owned by the pool; the registry only lets the server
//! reach their sockets during a forced shutdown.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use jobpool_core::{JobId, SpinLock};

use crate::session::{Session, SessionSocket};

#[derive(Default)]
pub struct SessionRegistry {
    sessions: SpinLock<HashMap<JobId, Weak<SessionSocket>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a session; entries for dropped sessions are pruned here
    pub fn register(&self, session: &Session) {
        let weak = Arc::downgrade(session.socket());
        self.sessions.with(|map| {
            map.retain(|_, s| s.strong_count() > 0);
            map.insert(session.id(), weak);
        });
    }

    /// Socket of a live session
    pub fn get(&self, id: JobId) -> Option<Arc<SessionSocket>> {
        self.sessions.lock().get(&id).and_then(Weak::upgrade)
    }

    /// Number of sessions still alive
    pub fn len(&self) -> usize {
        self.sessions.with(|map| {
            map.retain(|_, s| s.strong_count() > 0);
            map.len()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shut down every live session's socket; returns how many were reached
    ///
    /// Lanes blocked in socket I/O return, see end-of-stream and drop
    /// their sessions.
    pub fn shutdown_all(&self) -> usize {
        let live: Vec<Arc<SessionSocket>> = self.sessions.with(|map| {
            let live = map.values().filter_map(Weak::upgrade).collect();
            map.clear();
            live
        });
        for socket in &live {
            socket.shutdown();
        }
        live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{connected, Inert};
    use std::io::Read;

    #[test]
    fn test_register_get_and_prune() {
        let registry = SessionRegistry::new();
        let (a, _ca) = connected(Arc::new(Inert(None)), 16);
        let (b, _cb) = connected(Arc::new(Inert(None)), 16);
        registry.register(&a);
        registry.register(&b);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(a.id()).is_some());

        let gone = b.id();
        drop(b);
        assert!(registry.get(gone).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_shutdown_all_reaches_peers() {
        let registry = SessionRegistry::new();
        let (session, mut client) = connected(Arc::new(Inert(None)), 16);
        registry.register(&session);

        assert_eq!(registry.shutdown_all(), 1);
        assert!(registry.is_empty());

        // The client sees end-of-stream
        let mut buf = [0u8; 4];
        assert_eq!(client.read(&mut buf).unwrap(), 0);
    }
}
