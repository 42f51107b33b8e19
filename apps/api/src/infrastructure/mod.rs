// Infrastructure layer module
// Connection registry and timer plumbing behind the broadcast server

pub mod hub;
pub mod scheduler;
