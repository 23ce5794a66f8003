//! Concurrency layer: sessions, their registry, and the dispatcher façade.
//!
//! Only [`Dispatcher`] is meant to be used by frontends; sessions and the
//! registry are exposed for inspection and tests.

pub mod dispatcher;
pub mod registry;
pub mod session;

pub use dispatcher::Dispatcher;
pub use registry::SessionRegistry;
pub use session::{RepositorySession, SessionSnapshot, SessionState};
