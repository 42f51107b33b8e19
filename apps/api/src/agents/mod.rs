// Agent orchestration modules
//
// Wire protocol, progress scripts and the server-side manager/worker pair
// that plays scripts against connected dashboards.

pub mod errors;
pub mod events;
pub mod manager;
pub mod messages;
pub mod script;
pub mod worker;

// Re-export main types
pub use errors::{DashboardError, DashboardResult};
pub use events::ServerEvent;
pub use manager::ManagerAgent;
pub use messages::ClientMessage;
pub use worker::WorkerAgent;
