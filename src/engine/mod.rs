//! Polling engine: provider selection, retrieval, thresholds and the snapshot handoff

pub mod alert;
pub mod calendar;
pub mod random;
pub mod retrieval;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod tracker;

pub use alert::{notifier_for, CommandNotifier, LogNotifier};
pub use random::{SequenceRandom, ThreadRandom};
pub use retrieval::{ProviderSelector, Retriever};
pub use session::{retrieve_once, supervise, Session, SessionExit};
pub use snapshot::{SnapshotStore, SnapshotWriter};
pub use state::{ResolvedProvider, SessionState};
pub use tracker::{evaluate, Evaluation, NotificationTracker};
