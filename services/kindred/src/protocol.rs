//! JSON-lines wire protocol between the collaborators and the engine.
//!
//! The transcription collaborator (and any user-control frontend) writes one
//! JSON object per line on stdin; the service writes one JSON object per line
//! on stdout for each engine command. Logging goes to stderr so the stdout
//! stream stays machine-readable.

use anyhow::{Context, Result};
use kindred_core::transcript::TranscriptSegment;
use kindred_core::{Command, SessionEvent};
use serde::{Deserialize, Serialize};

/// One inbound line.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Segment(TranscriptSegment),
    Dismiss,
    Skip,
    Next,
    End,
}

impl From<ClientEvent> for SessionEvent {
    fn from(event: ClientEvent) -> Self {
        match event {
            ClientEvent::Segment(segment) => SessionEvent::Segment(segment),
            ClientEvent::Dismiss => SessionEvent::Dismiss,
            ClientEvent::Skip => SessionEvent::Skip,
            ClientEvent::Next => SessionEvent::ForceNext,
            ClientEvent::End => SessionEvent::End,
        }
    }
}

/// One outbound line.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerLine<'a> {
    Question(&'a kindred_core::domain::GeneratedQuestion),
    Report(&'a kindred_core::domain::SessionReport),
}

pub fn parse_event(line: &str) -> Result<ClientEvent> {
    serde_json::from_str(line).with_context(|| format!("malformed event line: {line}"))
}

pub fn render_command(command: &Command) -> Result<String> {
    let line = match command {
        Command::PresentQuestion(question) => ServerLine::Question(question),
        Command::SessionComplete(report) => ServerLine::Report(report),
    };
    serde_json::to_string(&line).context("failed to serialize command")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::domain::{ConnectionDomain, GeneratedQuestion};

    #[test]
    fn parses_a_segment_event() {
        let line = r#"{"type":"segment","speakerId":"p1","speakerName":"Alice","text":"I love hiking","timestampMs":12000,"isFinal":true}"#;
        match parse_event(line).unwrap() {
            ClientEvent::Segment(segment) => {
                assert_eq!(segment.speaker_name, "Alice");
                assert!(segment.is_final);
            }
            other => panic!("expected segment, got {other:?}"),
        }
    }

    #[test]
    fn parses_control_events() {
        assert!(matches!(
            parse_event(r#"{"type":"dismiss"}"#).unwrap(),
            ClientEvent::Dismiss
        ));
        assert!(matches!(parse_event(r#"{"type":"skip"}"#).unwrap(), ClientEvent::Skip));
        assert!(matches!(parse_event(r#"{"type":"next"}"#).unwrap(), ClientEvent::Next));
        assert!(matches!(parse_event(r#"{"type":"end"}"#).unwrap(), ClientEvent::End));
    }

    #[test]
    fn rejects_unknown_lines() {
        assert!(parse_event(r#"{"type":"reboot"}"#).is_err());
        assert!(parse_event("not json").is_err());
    }

    #[test]
    fn renders_a_question_line() {
        let question = GeneratedQuestion {
            question: "What made you laugh today?".to_string(),
            domain: ConnectionDomain::CurrentSituation,
            follow_up: None,
            reasoning: "light opener".to_string(),
        };
        let line = render_command(&Command::PresentQuestion(question)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "question");
        assert_eq!(value["question"], "What made you laugh today?");
        assert_eq!(value["domain"], "current_situation");
        assert!(value.get("followUp").is_none());
    }
}
