use crate::domain::{ConversationAnalysis, GeneratedQuestion, SessionSummary, Vibe};
use crate::question::QuestionContext;
use anyhow::{Context, Result};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Background handed to the reasoning service so its judgments about the
/// conversation are grounded in the same framework across all call shapes.
const CONNECTION_RESEARCH: &str = r#"
Based on psychology research on interpersonal processes and connection:

CORE THEORIES:
1. Social Penetration Theory (SPT): Relationships deepen through increasing breadth and depth of self-disclosure over time
2. Uncertainty Reduction Theory (URT): People seek information about others to reduce uncertainty and make interaction predictable
3. Strong social connections affect both psychological and physiological health outcomes

KEY DOMAINS FOR CONNECTION:
1. VALUES/BELIEFS: Understanding what matters to someone, their principles, passions
2. PERSONAL HISTORY/IDENTITY: Past experiences, upbringing, cultural background
3. ASPIRATIONS/GOALS/MOTIVATIONS: Future direction, what drives them, meaning
4. EMOTIONS/INNER WORLD: Feelings, fears, joys, vulnerabilities
5. RELATIONAL STYLE/PREFERENCES: Communication style, boundaries, how they relate
6. CURRENT SITUATION/CONTEXT: What's happening now, current challenges/joys

BEST PRACTICES:
- Use open-ended questions to invite stories
- Practice active listening and reflect back
- Encourage mutual sharing (two-way disclosure)
- Recognize depth takes time - start superficial, move deeper
- Be mindful of readiness - trust and safety matter
- Pay attention to non-verbal cues
"#;

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub content: String,
}

// The `Reasoning` trait is the contract with the external reasoning service:
// four call shapes, each returning a structured value the engine can act on.
// The engine depends on this abstraction rather than a concrete client, so
// unit tests drive the whole facilitation loop with `mockall`'s
// `MockReasoning` and no network.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Reasoning {
    /// Assess which connection domains the conversation has explored so far.
    async fn analyze_conversation(
        &self,
        transcript: &str,
        vibe: Vibe,
        asked_questions: &[String],
    ) -> Result<ConversationAnalysis>;

    /// Produce one new question fitting the given context.
    async fn generate_question(&self, context: &QuestionContext) -> Result<GeneratedQuestion>;

    /// Binary judgment: is now a natural opening to interject a question?
    async fn judge_timing(&self, recent_transcript: &str) -> Result<bool>;

    /// Closing themes, insights and depth score for the whole session.
    async fn summarize_session(
        &self,
        transcript: &str,
        vibe: Vibe,
        duration_minutes: u64,
        questions_answered: usize,
    ) -> Result<SessionSummary>;
}

/// OpenAI chat-completions implementation of [`Reasoning`].
///
/// Analysis, generation and summarization use the configured chat model; the
/// timing judgment is a tiny yes/no call and runs on a cheaper model.
pub struct ReasoningClient {
    client: Client,
    api_key: String,
    chat_model: String,
    timing_model: String,
}

impl ReasoningClient {
    pub fn new(api_key: String, chat_model: String, timing_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            chat_model,
            timing_model,
        }
    }

    async fn chat(&self, body: serde_json::Value) -> Result<String> {
        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .json::<LlmResponse>()
            .await?;

        let content = resp
            .choices
            .first()
            .ok_or_else(|| anyhow::anyhow!("no choices in completion response"))?
            .message
            .content
            .clone();
        Ok(content)
    }
}

#[async_trait]
impl Reasoning for ReasoningClient {
    async fn analyze_conversation(
        &self,
        transcript: &str,
        vibe: Vibe,
        asked_questions: &[String],
    ) -> Result<ConversationAnalysis> {
        let system = format!(
            "You are an expert in interpersonal psychology and building deep human connections.\n\n{CONNECTION_RESEARCH}\n\nAnalyze conversations to identify which connection domains have been explored and suggest next areas to deepen the relationship."
        );
        let user = format!(
            r#"Analyze this conversation transcript and identify which connection domains have been explored.

Current Vibe: {vibe}
Transcript: {transcript}
Previously Asked Questions: {asked}

Return a JSON object with:
- exploredDomains: array of domains that have been discussed (values_beliefs, personal_history, aspirations, emotions, relational_style, current_situation)
- unexploredDomains: array of domains not yet explored
- connectionDepth: number 0-10 indicating how deep the connection is
- suggestedDomain: the next domain to explore for deepening connection
- reasoning: brief explanation of your analysis

Respond ONLY with valid JSON."#,
            asked = asked_questions.join(", "),
        );

        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "temperature": 0.7,
            "response_format": { "type": "json_object" }
        });

        let content = self.chat(body).await?;
        serde_json::from_str(&content).context("failed to parse conversation analysis response")
    }

    async fn generate_question(&self, context: &QuestionContext) -> Result<GeneratedQuestion> {
        let system = format!(
            r#"You are an expert facilitator of deep human connection.

{CONNECTION_RESEARCH}

Your role is to generate questions that:
1. Build on what's been discussed (continuity)
2. Deepen the conversation in unexplored domains
3. Match the vibe (fun, thoughtful, or deep)
4. Feel natural and timely
5. Encourage mutual vulnerability and self-disclosure
6. Are open-ended to invite stories

VIBE GUIDELINES:
- Fun: Light, playful, creative - but still meaningful
- Thoughtful: Intellectual, reflective, perspective-shifting
- Deep: Vulnerable, emotional, intimate
- Mixed: Balance of all three"#
        );

        let analysis = &context.analysis;
        let explored = if analysis.explored_domains.is_empty() {
            "none yet".to_string()
        } else {
            analysis
                .explored_domains
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let recent = tail_chars(&context.recent_transcript, 500);
        let last_asked = context
            .asked_questions
            .iter()
            .rev()
            .take(3)
            .rev()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        let user = format!(
            r#"Generate the next question for this conversation.

Context:
- Current Vibe: {vibe}
- Connection Depth: {depth}/10
- Explored Domains: {explored}
- Suggested Domain: {suggested}
- Reasoning: {reasoning}
- Recent Conversation: {recent}
- Previously Asked: {last_asked}

Generate ONE question that:
1. Fits the {vibe} vibe
2. Explores the {suggested} domain
3. Builds naturally on the recent conversation
4. Hasn't been asked before
5. Encourages deeper connection

Return JSON with:
- question: the question text
- domain: the connection domain it targets
- followUp: (optional) a gentle follow-up prompt if they go shallow
- reasoning: why this question fits the moment

Respond ONLY with valid JSON."#,
            vibe = context.vibe,
            depth = analysis.connection_depth,
            suggested = analysis.suggested_domain,
            reasoning = analysis.reasoning,
        );

        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "temperature": 0.8,
            "response_format": { "type": "json_object" }
        });

        let content = self.chat(body).await?;
        serde_json::from_str(&content).context("failed to parse generated question response")
    }

    async fn judge_timing(&self, recent_transcript: &str) -> Result<bool> {
        let user = format!(
            r#"Recent conversation:
{recent}

Is this a good moment to introduce a new question? Consider:
- Is the conversation flowing naturally? (if yes, don't interrupt)
- Has there been a natural pause or lull? (good time)
- Are they deep in a topic? (let them continue)
- Has the energy dropped? (good time for new question)

Reply with just "yes" or "no"."#,
            recent = tail_chars(recent_transcript, 300),
        );

        let body = serde_json::json!({
            "model": self.timing_model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert facilitator. Determine if this is a good moment to introduce a new question, or if the conversation is flowing naturally and should continue uninterrupted."
                },
                { "role": "user", "content": user }
            ],
            "temperature": 0.3,
            "max_tokens": 10
        });

        let content = self.chat(body).await?;
        Ok(content.trim().to_lowercase() == "yes")
    }

    async fn summarize_session(
        &self,
        transcript: &str,
        vibe: Vibe,
        duration_minutes: u64,
        questions_answered: usize,
    ) -> Result<SessionSummary> {
        let system = format!(
            "You are an expert at analyzing conversations and identifying themes, insights, and connection depth.\n\n{CONNECTION_RESEARCH}"
        );
        let user = format!(
            r#"Analyze this conversation and provide a summary.

Duration: {duration_minutes} minutes
Vibe: {vibe}
Questions Answered: {questions_answered}
Full Transcript: {transcript}

Return JSON with:
- keyThemes: array of 3-5 main themes discussed (short phrases)
- insights: 2-3 sentence summary of what made this conversation meaningful
- connectionDepth: 0-10 score of how deep the connection went

Respond ONLY with valid JSON."#
        );

        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "temperature": 0.7,
            "response_format": { "type": "json_object" }
        });

        let content = self.chat(body).await?;
        serde_json::from_str(&content).context("failed to parse session summary response")
    }
}

/// Last `n` characters of `s`, on a character boundary.
fn tail_chars(s: &str, n: usize) -> &str {
    match s.char_indices().rev().nth(n.saturating_sub(1)) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
