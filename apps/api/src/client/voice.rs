// Live speech capture seam
//
// Recognition itself is an external capability; the dashboard only consumes
// the fragments it produces.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::agents::errors::DashboardResult;

/// One recognition result; interim fragments may be revised later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFragment {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptFragment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Source of live transcript fragments (microphone plus recogniser)
///
/// The stream ends when capture stops.
#[async_trait]
pub trait SpeechCapture: Send {
    async fn start_capture(&mut self) -> DashboardResult<BoxStream<'static, TranscriptFragment>>;
}
