// Dashboard client modules
//
// State store, reconnecting channel, collaborator adapter and the offline
// simulation that stands in for the broadcast server.

pub mod collaborator;
pub mod connection;
pub mod dashboard;
pub mod fallback;
pub mod notifications;
pub mod store;
pub mod voice;

pub use collaborator::{Collaborator, HttpCollaborator};
pub use connection::{ConnectionManager, LinkState};
pub use dashboard::Dashboard;
pub use fallback::LocalSimulation;
pub use notifications::{Notification, Notifier, Severity};
pub use store::{reduce, DashboardState, Origin, RosterSource, StateStore, StoreEvent};
pub use voice::{SpeechCapture, TranscriptFragment};
