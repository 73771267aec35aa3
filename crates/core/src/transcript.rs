use serde::{Deserialize, Serialize};

/// One unit of transcribed speech from the speech-to-text collaborator.
///
/// Interim (`is_final == false`) segments are provisional: the collaborator
/// re-emits them with growing text as recognition progresses, then closes the
/// utterance with a final segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    pub speaker_id: String,
    pub speaker_name: String,
    pub text: String,
    pub timestamp_ms: u64,
    pub is_final: bool,
}

/// Ordered, deduplicated record of the conversation.
///
/// Reconciliation rules:
/// - an interim segment replaces a trailing interim segment rather than
///   appending, so at most one trailing interim exists at any time;
/// - a final segment is appended unless its text matches the most recent
///   final segment's text (the collaborator sometimes emits the same final
///   result twice);
/// - a first-ever interim segment is appended as-is.
///
/// Stale interims that were followed by a final stay in the log; every text
/// query filters to final segments only.
#[derive(Debug, Default)]
pub struct TranscriptLog {
    segments: Vec<TranscriptSegment>,
    last_final_text: String,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, segment: TranscriptSegment) {
        if !segment.is_final {
            if let Some(last) = self.segments.last_mut() {
                if !last.is_final {
                    *last = segment;
                    return;
                }
            }
            self.segments.push(segment);
            return;
        }

        if segment.text == self.last_final_text {
            tracing::debug!("dropping duplicate final segment: {:?}", segment.text);
            return;
        }
        self.last_final_text = segment.text.clone();
        self.segments.push(segment);
    }

    /// Full conversation so far, one `"{speaker}: {text}"` line per final
    /// segment, in arrival order.
    pub fn full_transcript(&self) -> String {
        self.render(|_| true)
    }

    /// Same as [`full_transcript`](Self::full_transcript), restricted to final
    /// segments with `timestamp_ms >= now_ms - window_minutes * 60_000`.
    pub fn recent_transcript(&self, window_minutes: u64, now_ms: u64) -> String {
        let cutoff = now_ms.saturating_sub(window_minutes * 60_000);
        self.render(|s| s.timestamp_ms >= cutoff)
    }

    /// Timestamp of the most recent final segment, if any.
    pub fn last_final_timestamp_ms(&self) -> Option<u64> {
        self.segments
            .iter()
            .rev()
            .find(|s| s.is_final)
            .map(|s| s.timestamp_ms)
    }

    fn render(&self, keep: impl Fn(&TranscriptSegment) -> bool) -> String {
        self.segments
            .iter()
            .filter(|s| s.is_final && keep(s))
            .map(|s| format!("{}: {}", s.speaker_name, s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[cfg(test)]
    fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str, timestamp_ms: u64, is_final: bool) -> TranscriptSegment {
        TranscriptSegment {
            speaker_id: "p1".to_string(),
            speaker_name: "Alice".to_string(),
            text: text.to_string(),
            timestamp_ms,
            is_final,
        }
    }

    #[test]
    fn interim_segments_collapse_into_one_final_line() {
        let mut log = TranscriptLog::new();
        log.ingest(segment("I l", 1_000, false));
        log.ingest(segment("I love", 1_500, false));
        log.ingest(segment("I love hiking", 2_000, true));

        assert_eq!(log.full_transcript(), "Alice: I love hiking");
    }

    #[test]
    fn never_two_consecutive_interims() {
        let mut log = TranscriptLog::new();
        log.ingest(segment("he", 1_000, false));
        log.ingest(segment("hello", 1_100, false));
        log.ingest(segment("hello there", 1_500, true));
        log.ingest(segment("how", 2_000, false));
        log.ingest(segment("how are you", 2_200, false));

        let interim_pairs = log
            .segments()
            .windows(2)
            .filter(|w| !w[0].is_final && !w[1].is_final)
            .count();
        assert_eq!(interim_pairs, 0);
    }

    #[test]
    fn duplicate_final_emissions_are_dropped() {
        let mut log = TranscriptLog::new();
        log.ingest(segment("good morning", 1_000, true));
        log.ingest(segment("good morning", 1_050, true));

        assert_eq!(log.full_transcript(), "Alice: good morning");
    }

    #[test]
    fn duplicate_check_survives_interleaved_interims() {
        let mut log = TranscriptLog::new();
        log.ingest(segment("good morning", 1_000, true));
        log.ingest(segment("good", 1_200, false));
        log.ingest(segment("good morning", 1_400, true));

        assert_eq!(log.full_transcript(), "Alice: good morning");
    }

    #[test]
    fn identical_text_from_different_utterances_still_appends_later() {
        let mut log = TranscriptLog::new();
        log.ingest(segment("yes", 1_000, true));
        log.ingest(segment("really", 2_000, true));
        log.ingest(segment("yes", 3_000, true));

        assert_eq!(log.full_transcript(), "Alice: yes\nAlice: really\nAlice: yes");
    }

    #[test]
    fn recent_window_filters_by_timestamp() {
        let mut log = TranscriptLog::new();
        log.ingest(segment("old news", 0, true));
        log.ingest(segment("fresh take", 290_000, true));

        let now = 300_000;
        assert_eq!(log.recent_transcript(5, now), "Alice: old news\nAlice: fresh take");
        assert_eq!(log.recent_transcript(1, now), "Alice: fresh take");
    }

    #[test]
    fn shrinking_window_never_grows_the_result() {
        let mut log = TranscriptLog::new();
        for (i, text) in ["a", "b", "c", "d"].iter().enumerate() {
            log.ingest(segment(text, i as u64 * 60_000, true));
        }

        let now = 240_000;
        let mut previous_len = usize::MAX;
        for window in (1..=5).rev() {
            let len = log.recent_transcript(window, now).len();
            assert!(len <= previous_len);
            previous_len = len;
        }
    }

    #[test]
    fn recent_is_suffix_of_full() {
        let mut log = TranscriptLog::new();
        log.ingest(segment("first", 0, true));
        log.ingest(segment("second", 200_000, true));
        log.ingest(segment("third", 290_000, true));

        let full = log.full_transcript();
        let recent = log.recent_transcript(2, 300_000);
        assert!(full.ends_with(&recent));
    }

    #[test]
    fn interims_never_appear_in_queries() {
        let mut log = TranscriptLog::new();
        log.ingest(segment("done talking", 1_000, true));
        log.ingest(segment("still typ", 2_000, false));

        assert_eq!(log.full_transcript(), "Alice: done talking");
        assert_eq!(log.last_final_timestamp_ms(), Some(1_000));
    }
}
