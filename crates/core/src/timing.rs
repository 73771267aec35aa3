use crate::reasoning::Reasoning;

/// Minimum gap between two presented questions.
pub const MIN_QUESTION_GAP_MS: u64 = 60_000;

/// Speech this recent means an utterance is likely still in progress.
pub const RECENT_SPEECH_WINDOW_MS: u64 = 5_000;

/// When the timing judgment itself fails, only allow asking past this gap.
pub const FALLBACK_GAP_MS: u64 = 120_000;

/// Decide whether now is an appropriate moment to interject a question.
///
/// The two hard rules run before any external call: the question cooldown,
/// and a hold-off while speech is in progress (keyed off the last final
/// segment's own timestamp). Only when both pass is the reasoning service
/// consulted for a judgment on the conversational flow.
pub async fn should_ask<R: Reasoning + ?Sized>(
    reasoning: &R,
    recent_transcript: &str,
    last_segment_ms: Option<u64>,
    last_question_ms: u64,
    now_ms: u64,
) -> bool {
    if now_ms.saturating_sub(last_question_ms) < MIN_QUESTION_GAP_MS {
        return false;
    }

    if let Some(ts) = last_segment_ms {
        if now_ms.saturating_sub(ts) < RECENT_SPEECH_WINDOW_MS {
            return false;
        }
    }

    match reasoning.judge_timing(recent_transcript).await {
        Ok(ask) => ask,
        Err(e) => {
            tracing::warn!("timing judgment failed, using conservative fallback: {e:#}");
            now_ms.saturating_sub(last_question_ms) > FALLBACK_GAP_MS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::MockReasoning;

    #[tokio::test]
    async fn cooldown_denies_without_any_external_call() {
        // No expectation set: the mock panics if judge_timing is reached.
        let reasoning = MockReasoning::new();
        let now = 1_000_000;

        let ask = should_ask(&reasoning, "Alice: hi", None, now - 30_000, now).await;
        assert!(!ask);
    }

    #[tokio::test]
    async fn very_recent_speech_denies_without_any_external_call() {
        let reasoning = MockReasoning::new();
        let now = 1_000_000;

        let ask = should_ask(&reasoning, "Alice: hi", Some(now - 2_000), now - 90_000, now).await;
        assert!(!ask);
    }

    #[tokio::test]
    async fn follows_the_service_judgment_when_hard_rules_pass() {
        let mut reasoning = MockReasoning::new();
        reasoning
            .expect_judge_timing()
            .returning(|_| Ok(true));
        let now = 1_000_000;

        let ask = should_ask(&reasoning, "Alice: hi", Some(now - 10_000), now - 90_000, now).await;
        assert!(ask);

        let mut reasoning = MockReasoning::new();
        reasoning
            .expect_judge_timing()
            .returning(|_| Ok(false));
        let ask = should_ask(&reasoning, "Alice: hi", Some(now - 10_000), now - 90_000, now).await;
        assert!(!ask);
    }

    #[tokio::test]
    async fn failure_falls_back_to_the_conservative_gap() {
        let mut reasoning = MockReasoning::new();
        reasoning
            .expect_judge_timing()
            .returning(|_| Err(anyhow::anyhow!("unreachable")));
        let now = 1_000_000;

        // 90 s since the last question: not enough under the fallback rule.
        assert!(!should_ask(&reasoning, "t", Some(now - 10_000), now - 90_000, now).await);
        // 150 s is.
        assert!(should_ask(&reasoning, "t", Some(now - 10_000), now - 150_000, now).await);
    }

    #[tokio::test]
    async fn a_session_with_no_questions_yet_passes_the_cooldown() {
        let mut reasoning = MockReasoning::new();
        reasoning
            .expect_judge_timing()
            .returning(|_| Ok(true));

        let ask = should_ask(&reasoning, "Alice: hi", Some(500_000), 0, 1_000_000).await;
        assert!(ask);
    }
}
