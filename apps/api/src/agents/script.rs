// Progress scripts played against the demo agents
//
// The broadcast server walks fixed 25/50/75/100 steps; the local simulation
// walks random increments that always land on 100 by the fourth tick. Both
// produce `agent_update` patches of the same shape.

use rand::Rng;

use crate::domain::agent::{AgentPatch, AgentStatus};

/// Agents every demo command is routed to
pub const DEMO_AGENTS: [&str; 2] = ["agent-1", "agent-2"];

/// Fixed server steps: progress and the action shown with it
pub const SERVER_STEPS: [(f64, &str); 4] = [
    (25.0, "Analyzing command..."),
    (50.0, "Connecting to services..."),
    (75.0, "Executing action..."),
    (100.0, "Completed successfully"),
];

/// Results attached to a task completed by the local simulation
pub const FALLBACK_RESULTS: [&str; 2] = ["Task completed successfully", "All agents finished execution"];

pub const FALLBACK_START: f64 = 10.0;
pub const FALLBACK_MIN_STEP: f64 = 22.5;
pub const FALLBACK_MAX_STEP: f64 = 30.0;

pub fn demo_agents() -> Vec<String> {
    DEMO_AGENTS.iter().map(|id| id.to_string()).collect()
}

/// First `max` characters of `text`, with an ellipsis
pub fn preview(text: &str, max: usize) -> String {
    let head: String = text.chars().take(max).collect();
    format!("{head}...")
}

/// Patches the server broadcasts for one agent, in order
pub fn server_script() -> Vec<AgentPatch> {
    SERVER_STEPS
        .iter()
        .map(|(progress, action)| AgentPatch {
            status: Some(if *progress >= 100.0 {
                AgentStatus::Completed
            } else {
                AgentStatus::Active
            }),
            progress: Some(*progress),
            last_action: Some(action.to_string()),
            ..AgentPatch::default()
        })
        .collect()
}

/// Result line the server synthesizes for one agent
pub fn server_result(agent_id: &str, command: &str) -> String {
    format!("Agent {} completed: {}", agent_id, preview(command, 50))
}

/// Patch marking agents active when the local simulation starts
pub fn fallback_kickoff(command: &str) -> AgentPatch {
    AgentPatch {
        status: Some(AgentStatus::Active),
        progress: Some(FALLBACK_START),
        last_action: Some(format!("Processing: {}", preview(command, 30))),
        ..AgentPatch::default()
    }
}

/// Patch marking agents completed when the local simulation ends
pub fn fallback_finish() -> AgentPatch {
    AgentPatch {
        status: Some(AgentStatus::Completed),
        progress: Some(100.0),
        last_action: Some("Task completed successfully".to_string()),
        ..AgentPatch::default()
    }
}

/// Progress values reached on each simulation tick
///
/// The last value is always 100; every earlier value is below it.
pub fn fallback_progress<R: Rng + ?Sized>(rng: &mut R) -> Vec<f64> {
    let mut progress = FALLBACK_START;
    let mut ticks = Vec::new();
    loop {
        progress += rng.gen_range(FALLBACK_MIN_STEP..=FALLBACK_MAX_STEP);
        if progress >= 100.0 {
            ticks.push(100.0);
            return ticks;
        }
        ticks.push(progress);
    }
}
