use axum::{body::Bytes, extract::State, Json};
use serde_json::json;

use crate::api::contracts::{VoiceTranscript, DEMO_TRANSCRIPT};
use crate::api::errors::ApiError;
use crate::api::AppState;

/// Transcribe a recorded voice command
///
/// POST /api/voice/process
///
/// The body is the raw audio payload. Recognition is simulated: after the
/// configured delay the fixed demo transcript is returned.
pub async fn process_voice(
    State(state): State<AppState>,
    audio: Bytes,
) -> Result<Json<VoiceTranscript>, ApiError> {
    if audio.is_empty() {
        return Err(ApiError::missing_audio());
    }
    tracing::info!(bytes = audio.len(), "processing voice command");

    tokio::time::sleep(state.voice_delay).await;

    Ok(Json(VoiceTranscript {
        text: DEMO_TRANSCRIPT.to_string(),
        confidence: 0.94,
        intent: "multi_action_request".to_string(),
        entities: json!({
            "contact": "Sarah Johnson",
            "actions": ["call", "schedule_meeting"],
            "topic": "project update",
            "timeframe": "next week",
        }),
        suggested_agents: vec![
            "agent-1".to_string(),
            "agent-2".to_string(),
            "agent-3".to_string(),
        ],
    }))
}
