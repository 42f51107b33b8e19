use serde::{Deserialize, Serialize};

use super::value_objects::{AgentPatch, AgentStatus};

/// Directory view of an agent, as served by `GET /api/agents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: AgentStatus,
    pub progress: f64,
    pub last_action: String,
    pub avatar: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Rolling performance counters shown next to an agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCounters {
    pub tasks_completed: u32,
    pub success_rate: f64,
    pub avg_response_time: u64,
}

/// A simulated worker with a status/progress lifecycle
///
/// Agents are seeded once per session and never removed. They change only
/// through `agent_update` patches or direct user controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: AgentStatus,
    pub progress: f64,
    pub last_action: String,
    pub avatar: String,
    pub capabilities: Vec<String>,
    #[serde(flatten)]
    pub counters: AgentCounters,
}

impl Agent {
    /// Builds a session agent from a directory entry
    pub fn from_summary(summary: AgentSummary, counters: AgentCounters) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            kind: summary.kind,
            status: summary.status,
            progress: summary.progress,
            last_action: summary.last_action,
            avatar: summary.avatar,
            capabilities: summary.capabilities,
            counters,
        }
    }

    /// Merges a patch into this agent, field by field
    ///
    /// An active agent whose progress reaches 100 becomes `Completed`.
    /// Entering `Completed` from any other status counts one finished task
    /// unless the patch sets the counter itself.
    pub fn apply(&mut self, patch: &AgentPatch) {
        let was_completed = self.status == AgentStatus::Completed;

        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(action) = &patch.last_action {
            self.last_action = action.clone();
        }
        if self.status == AgentStatus::Active && self.progress >= 100.0 {
            self.status = AgentStatus::Completed;
        }

        match patch.tasks_completed {
            Some(count) => self.counters.tasks_completed = count,
            None if !was_completed && self.status == AgentStatus::Completed => {
                self.counters.tasks_completed += 1;
            }
            None => {}
        }
    }

    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind.clone(),
            status: self.status,
            progress: self.progress,
            last_action: self.last_action.clone(),
            avatar: self.avatar.clone(),
            capabilities: self.capabilities.clone(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn summary(
    id: &str,
    name: &str,
    kind: &str,
    status: AgentStatus,
    progress: f64,
    last_action: &str,
    avatar: &str,
    capabilities: &[&str],
) -> AgentSummary {
    AgentSummary {
        id: id.to_string(),
        name: name.to_string(),
        kind: kind.to_string(),
        status,
        progress,
        last_action: last_action.to_string(),
        avatar: avatar.to_string(),
        capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
    }
}

/// The agent directory served to dashboards
pub fn directory_roster() -> Vec<AgentSummary> {
    vec![
        summary(
            "agent-1",
            "CallBot Pro",
            "phone",
            AgentStatus::Idle,
            0.0,
            "Ready for calls",
            "📞",
            &["voice_calls", "sms", "voicemail"],
        ),
        summary(
            "agent-2",
            "BookingMaster",
            "booking",
            AgentStatus::Active,
            65.0,
            "Processing restaurant reservation",
            "📅",
            &["calendar", "reservations", "scheduling"],
        ),
        summary(
            "agent-3",
            "EmailAssistant",
            "email",
            AgentStatus::Completed,
            100.0,
            "Sent follow-up emails",
            "✉️",
            &["email", "templates", "tracking"],
        ),
        summary(
            "agent-4",
            "FollowUpBot",
            "followup",
            AgentStatus::Idle,
            0.0,
            "Monitoring for follow-ups",
            "🔄",
            &["reminders", "tracking", "automation"],
        ),
    ]
}

/// Built-in roster used when the directory cannot be reached
///
/// Every agent starts idle so the dashboard is never empty.
pub fn fallback_roster() -> Vec<Agent> {
    let rows = [
        ("agent-1", "Ready for calls", 23, 96.0, 850),
        ("agent-2", "Ready for bookings", 18, 94.0, 1200),
        ("agent-3", "Ready for emails", 31, 98.0, 650),
        ("agent-4", "Monitoring for follow-ups", 15, 92.0, 950),
    ];

    directory_roster()
        .into_iter()
        .zip(rows)
        .map(|(mut entry, (_, last_action, done, rate, latency))| {
            entry.status = AgentStatus::Idle;
            entry.progress = 0.0;
            entry.last_action = last_action.to_string();
            Agent::from_summary(
                entry,
                AgentCounters {
                    tasks_completed: done,
                    success_rate: rate,
                    avg_response_time: latency,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentControl;

    fn idle_agent() -> Agent {
        fallback_roster().remove(0)
    }

    #[test]
    fn fallback_roster_is_all_idle() {
        let roster = fallback_roster();

        assert_eq!(roster.len(), 4);
        assert!(roster.iter().all(|a| a.status == AgentStatus::Idle));
        assert!(roster.iter().all(|a| a.progress == 0.0));
        assert_eq!(roster[1].last_action, "Ready for bookings");
    }

    #[test]
    fn directory_roster_ids_are_unique() {
        let roster = directory_roster();
        let mut ids: Vec<_> = roster.iter().map(|a| a.id.clone()).collect();
        ids.dedup();
        assert_eq!(ids.len(), roster.len());
    }

    #[test]
    fn apply_overwrites_only_present_fields() {
        let mut agent = idle_agent();
        agent.apply(&AgentPatch {
            progress: Some(40.0),
            ..AgentPatch::default()
        });

        assert_eq!(agent.progress, 40.0);
        assert_eq!(agent.status, AgentStatus::Idle);
        assert_eq!(agent.last_action, "Ready for calls");
    }

    #[test]
    fn entering_completed_counts_a_task_once() {
        let mut agent = idle_agent();
        let before = agent.counters.tasks_completed;
        let done = AgentPatch {
            status: Some(AgentStatus::Completed),
            progress: Some(100.0),
            ..AgentPatch::default()
        };

        agent.apply(&done);
        agent.apply(&done);

        assert_eq!(agent.counters.tasks_completed, before + 1);
    }

    #[test]
    fn active_agent_reaching_full_progress_completes() {
        let mut agent = idle_agent();
        let before = agent.counters.tasks_completed;
        agent.apply(&AgentControl::Start.patch());
        agent.apply(&AgentPatch {
            progress: Some(100.0),
            ..AgentPatch::default()
        });

        assert_eq!(agent.status, AgentStatus::Completed);
        assert_eq!(agent.counters.tasks_completed, before + 1);
    }

    #[test]
    fn idle_agent_at_full_progress_stays_idle() {
        let mut agent = idle_agent();
        agent.apply(&AgentPatch {
            progress: Some(100.0),
            ..AgentPatch::default()
        });

        assert_eq!(agent.status, AgentStatus::Idle);
    }

    #[test]
    fn explicit_counter_wins_over_derived_increment() {
        let mut agent = idle_agent();
        agent.apply(&AgentPatch {
            status: Some(AgentStatus::Completed),
            tasks_completed: Some(7),
            ..AgentPatch::default()
        });

        assert_eq!(agent.counters.tasks_completed, 7);
    }

    #[test]
    fn summary_serializes_type_field() {
        let json = serde_json::to_value(&directory_roster()[0]).unwrap();
        assert_eq!(json["type"], "phone");
        assert_eq!(json["lastAction"], "Ready for calls");
    }
}
