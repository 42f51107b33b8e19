// Agent domain module
// Contains the agent entity, its patches and the built-in rosters

#![allow(clippy::module_inception)]

pub mod agent;
pub mod value_objects;

// Re-export main types for convenience
pub use agent::{directory_roster, fallback_roster, Agent, AgentCounters, AgentSummary};
pub use value_objects::{AgentControl, AgentPatch, AgentStatus};
