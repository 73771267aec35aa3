use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mood selector for the session, steering the tone of generated questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    Fun,
    Thoughtful,
    Deep,
    Mixed,
}

impl Vibe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vibe::Fun => "fun",
            Vibe::Thoughtful => "thoughtful",
            Vibe::Deep => "deep",
            Vibe::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vibe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fun" => Ok(Vibe::Fun),
            "thoughtful" => Ok(Vibe::Thoughtful),
            "deep" => Ok(Vibe::Deep),
            "mixed" => Ok(Vibe::Mixed),
            other => Err(format!(
                "unknown vibe '{other}', expected one of: fun, thoughtful, deep, mixed"
            )),
        }
    }
}

/// A relational topic category used to track conversational breadth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionDomain {
    ValuesBeliefs,
    PersonalHistory,
    Aspirations,
    Emotions,
    RelationalStyle,
    CurrentSituation,
}

impl ConnectionDomain {
    pub const ALL: [ConnectionDomain; 6] = [
        ConnectionDomain::ValuesBeliefs,
        ConnectionDomain::PersonalHistory,
        ConnectionDomain::Aspirations,
        ConnectionDomain::Emotions,
        ConnectionDomain::RelationalStyle,
        ConnectionDomain::CurrentSituation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionDomain::ValuesBeliefs => "values_beliefs",
            ConnectionDomain::PersonalHistory => "personal_history",
            ConnectionDomain::Aspirations => "aspirations",
            ConnectionDomain::Emotions => "emotions",
            ConnectionDomain::RelationalStyle => "relational_style",
            ConnectionDomain::CurrentSituation => "current_situation",
        }
    }
}

impl fmt::Display for ConnectionDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured assessment of how the conversation has evolved, produced by the
/// reasoning service at most once per analysis cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAnalysis {
    pub explored_domains: Vec<ConnectionDomain>,
    pub unexplored_domains: Vec<ConnectionDomain>,
    /// 0-10 scale.
    pub connection_depth: u8,
    pub suggested_domain: ConnectionDomain,
    pub reasoning: String,
}

/// A question produced for presentation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question: String,
    pub domain: ConnectionDomain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
    #[serde(default)]
    pub reasoning: String,
}

/// Closing themes, insights and depth score produced at session end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub key_themes: Vec<String>,
    pub insights: String,
    /// 0-10 scale.
    pub connection_depth: u8,
}

/// The value handed off to the reflection stage when the session ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub duration_minutes: u64,
    pub key_themes: Vec<String>,
    pub insights: String,
    pub connection_depth: u8,
    pub questions_answered: usize,
    pub top_questions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains_round_trip_snake_case() {
        let json = serde_json::to_string(&ConnectionDomain::ValuesBeliefs).unwrap();
        assert_eq!(json, r#""values_beliefs""#);
        let parsed: ConnectionDomain = serde_json::from_str(r#""relational_style""#).unwrap();
        assert_eq!(parsed, ConnectionDomain::RelationalStyle);
    }

    #[test]
    fn vibe_parses_case_insensitively() {
        assert_eq!("Deep".parse::<Vibe>().unwrap(), Vibe::Deep);
        assert!("sombre".parse::<Vibe>().is_err());
    }

    #[test]
    fn analysis_deserializes_from_wire_shape() {
        let raw = r#"{
            "exploredDomains": ["current_situation"],
            "unexploredDomains": ["emotions", "aspirations"],
            "connectionDepth": 4,
            "suggestedDomain": "emotions",
            "reasoning": "They have stayed on surface topics so far."
        }"#;
        let analysis: ConversationAnalysis = serde_json::from_str(raw).unwrap();
        assert_eq!(analysis.connection_depth, 4);
        assert_eq!(analysis.suggested_domain, ConnectionDomain::Emotions);
        assert_eq!(analysis.explored_domains, vec![ConnectionDomain::CurrentSituation]);
    }

    #[test]
    fn question_tolerates_missing_optional_fields() {
        let raw = r#"{"question": "What matters most to you?", "domain": "values_beliefs"}"#;
        let q: GeneratedQuestion = serde_json::from_str(raw).unwrap();
        assert!(q.follow_up.is_none());
        assert!(q.reasoning.is_empty());
    }
}
