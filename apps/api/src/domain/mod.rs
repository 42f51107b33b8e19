// Domain layer module exports
// Entities and value objects shared by the broadcast server and the
// dashboard client. Independent of transport concerns.

pub mod agent;
pub mod log;
pub mod metrics;
pub mod queue;
pub mod task;
