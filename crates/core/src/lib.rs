pub mod analyzer;
pub mod domain;
pub mod question;
pub mod reasoning;
pub mod session;
pub mod summary;
pub mod timing;
pub mod transcript;

use domain::{GeneratedQuestion, SessionReport};
use transcript::TranscriptSegment;

/// Commands the engine issues to the runtime.
///
/// This enum is the primary API for decoupling the session's decision-making
/// from the runtime's execution of side effects (like displaying a question).
#[derive(Debug, Clone)]
pub enum Command {
    /// Surface this question to the participants.
    PresentQuestion(GeneratedQuestion),
    /// The session has ended; hand the report to the reflection stage.
    SessionComplete(SessionReport),
}

/// Inputs the runtime feeds into the engine's event loop.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A speech event from the transcription collaborator.
    Segment(TranscriptSegment),
    /// The participants answered the presented question.
    Dismiss,
    /// The participants skipped the presented question.
    Skip,
    /// Explicit request for the next question, bypassing the timing gate.
    ForceNext,
    /// Terminate the session and produce the report.
    End,
}
