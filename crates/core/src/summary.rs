use crate::domain::{SessionReport, SessionSummary, Vibe};
use crate::reasoning::Reasoning;

/// Number of recent questions surfaced in the session report.
pub const TOP_QUESTION_COUNT: usize = 3;

/// Summarize the session, falling back to a generic summary when the
/// reasoning service is unavailable. Summarization never blocks teardown on
/// an error.
pub async fn summarize<R: Reasoning + ?Sized>(
    reasoning: &R,
    transcript: &str,
    vibe: Vibe,
    duration_minutes: u64,
    questions_answered: usize,
) -> SessionSummary {
    match reasoning
        .summarize_session(transcript, vibe, duration_minutes, questions_answered)
        .await
    {
        Ok(mut summary) => {
            summary.connection_depth = summary.connection_depth.min(10);
            summary
        }
        Err(e) => {
            tracing::warn!("session summarization failed, using fallback: {e:#}");
            fallback_summary()
        }
    }
}

pub fn fallback_summary() -> SessionSummary {
    SessionSummary {
        key_themes: vec![
            "Shared experiences".to_string(),
            "Personal growth".to_string(),
            "Future aspirations".to_string(),
        ],
        insights: "You shared meaningful moments and learned more about each other. The conversation touched on both lighthearted and deeper topics.".to_string(),
        connection_depth: 5,
    }
}

/// Combine the summary with the scheduler's bookkeeping into the hand-off
/// value for the reflection stage.
pub fn build_report(
    summary: SessionSummary,
    duration_minutes: u64,
    questions_answered: usize,
    asked_questions: &[String],
) -> SessionReport {
    let top_questions = asked_questions
        .iter()
        .rev()
        .take(TOP_QUESTION_COUNT)
        .rev()
        .cloned()
        .collect();

    SessionReport {
        duration_minutes,
        key_themes: summary.key_themes,
        insights: summary.insights,
        connection_depth: summary.connection_depth,
        questions_answered,
        top_questions,
    }
}
