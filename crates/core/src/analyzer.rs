use crate::domain::{ConnectionDomain, ConversationAnalysis, Vibe};
use crate::reasoning::Reasoning;

/// Below this much final transcript text there is too little signal to
/// analyze; the scheduler skips the cycle entirely.
pub const MIN_TRANSCRIPT_CHARS: usize = 100;

/// Minimum age before the scheduler replaces a successful analysis.
pub const ANALYSIS_INTERVAL_MS: u64 = 30_000;

/// Assess the conversation, falling back to a deterministic baseline when the
/// reasoning service is unavailable or returns something unusable.
pub async fn analyze<R: Reasoning + ?Sized>(
    reasoning: &R,
    transcript: &str,
    vibe: Vibe,
    asked_questions: &[String],
) -> ConversationAnalysis {
    match reasoning
        .analyze_conversation(transcript, vibe, asked_questions)
        .await
    {
        Ok(mut analysis) => {
            analysis.connection_depth = analysis.connection_depth.min(10);
            analysis
        }
        Err(e) => {
            tracing::warn!("conversation analysis failed, using fallback: {e:#}");
            fallback_analysis()
        }
    }
}

/// All domains unexplored, minimal depth, and the lowest-risk entry topic.
pub fn fallback_analysis() -> ConversationAnalysis {
    ConversationAnalysis {
        explored_domains: vec![],
        unexplored_domains: ConnectionDomain::ALL.to_vec(),
        connection_depth: 1,
        suggested_domain: ConnectionDomain::CurrentSituation,
        reasoning: "Starting with current situation as a comfortable entry point.".to_string(),
    }
}
