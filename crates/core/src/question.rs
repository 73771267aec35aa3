use crate::domain::{ConnectionDomain, ConversationAnalysis, GeneratedQuestion, Vibe};
use crate::reasoning::Reasoning;

/// Everything the reasoning service needs to craft the next question.
#[derive(Debug, Clone)]
pub struct QuestionContext {
    pub vibe: Vibe,
    pub analysis: ConversationAnalysis,
    pub recent_transcript: String,
    pub asked_questions: Vec<String>,
}

/// Produce one new question, falling back to the fixed per-vibe default when
/// the reasoning service is unavailable. Never fails.
pub async fn generate<R: Reasoning + ?Sized>(
    reasoning: &R,
    context: &QuestionContext,
) -> GeneratedQuestion {
    match reasoning.generate_question(context).await {
        Ok(question) => question,
        Err(e) => {
            tracing::warn!("question generation failed, using fallback: {e:#}");
            fallback_question(context.vibe)
        }
    }
}

/// The fixed offline default for each vibe.
pub fn fallback_question(vibe: Vibe) -> GeneratedQuestion {
    let question = match vibe {
        Vibe::Fun => "What's something that made you laugh recently?",
        Vibe::Thoughtful => "What's an idea that's been on your mind lately?",
        Vibe::Deep => "What do you need to hear right now?",
        Vibe::Mixed => "What's been the best part of your week?",
    };

    GeneratedQuestion {
        question: question.to_string(),
        domain: ConnectionDomain::CurrentSituation,
        follow_up: None,
        reasoning: "Fallback question due to service error".to_string(),
    }
}
