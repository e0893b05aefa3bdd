//! OpenRouter chat-completions client
//!
//! Asks the model for JSON objects and validates them before they reach the
//! orchestrator. Also serves as a topic source.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Judgment, JudgmentRequest, OracleError, ParticipantSummary, ScoringOracle};
use crate::config::OracleConfig;
use crate::models::Score;
use crate::topics::{Genre, TopicSource, TOPICS_PER_GENRE};

/// Scoring oracle and topic source backed by an OpenRouter model
pub struct OpenRouterOracle {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl OpenRouterOracle {
    /// Build from config, reading the API key from the configured variable
    pub fn from_config(config: &OracleConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::new(config, api_key)
    }

    pub fn new(config: &OracleConfig, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one user prompt and return the message content
    async fn complete(&self, prompt: String) -> Result<String, OracleError> {
        #[derive(Serialize)]
        struct ChatMessage {
            role: &'static str,
            content: String,
        }

        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            kind: &'static str,
        }

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            temperature: f32,
            response_format: ResponseFormat,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: Option<String>,
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| OracleError::Unavailable("no API key configured".into()))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status { status, body });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(OracleError::EmptyResponse)?;

        debug!(model = %self.model, bytes = content.len(), "Oracle replied");
        Ok(content)
    }
}

#[async_trait]
impl ScoringOracle for OpenRouterOracle {
    async fn score_argument(
        &self,
        argument: &str,
        topic: &str,
        round: Option<u32>,
    ) -> Result<Score, OracleError> {
        let content = self.complete(score_prompt(argument, topic, round)).await?;
        parse_score(&content)
    }

    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, OracleError> {
        let content = self.complete(judgment_prompt(request)).await?;
        parse_judgment(&content)
    }
}

#[async_trait]
impl TopicSource for OpenRouterOracle {
    async fn generate_topic(&self) -> Result<String, OracleError> {
        #[derive(Deserialize)]
        struct Reply {
            topic: String,
        }

        let prompt = "Propose one short, light-hearted but genuinely debatable topic for a \
                      two-player debate game.\n\nRespond with a JSON object: {\"topic\": \"...\"}"
            .to_string();
        let content = self.complete(prompt).await?;
        let reply: Reply =
            serde_json::from_str(&content).map_err(|e| OracleError::Malformed(e.to_string()))?;
        let topic = reply.topic.trim();
        if topic.is_empty() {
            return Err(OracleError::Malformed("empty topic".into()));
        }
        Ok(topic.to_string())
    }

    async fn topics_for_genre(&self, genre: Genre) -> Result<Vec<String>, OracleError> {
        let prompt = format!(
            "Propose exactly {n} short, debatable topics in the genre \"{genre}\" for a \
             two-player debate game.\n\nRespond with a JSON object: {{\"topics\": [\"...\", \"...\", \"...\"]}}",
            n = TOPICS_PER_GENRE,
            genre = genre,
        );
        let content = self.complete(prompt).await?;
        parse_topics(&content)
    }
}

fn score_prompt(argument: &str, topic: &str, round: Option<u32>) -> String {
    let round = round.map(|r| format!("Round: {r}\n")).unwrap_or_default();
    format!(
        r#"You are a debate judge. Score the following argument on three criteria from 0 to 10:
- Logic: how well reasoned is the argument?
- Relevance: how closely does it address the topic?
- Persuasiveness: how convincing is it?
Deduct points for fallacies, irrelevant points or lack of evidence. Humour is welcome.

Debate topic: {topic}
{round}Argument: "{argument}"

Respond with a JSON object with exactly these numeric fields:
{{"logic": 7.5, "relevance": 8.0, "persuasiveness": 7.0}}"#
    )
}

fn write_summary(out: &mut String, label: &str, p: &ParticipantSummary) {
    let overall = p.overall.dimensions();
    let _ = writeln!(out, "{label}: {}", p.id);
    for (i, s) in p.turn_scores.iter().enumerate() {
        let _ = writeln!(
            out,
            "- Round {}: logic {:.1}, relevance {:.1}, persuasiveness {:.1} (total {:.1})",
            i + 1,
            s.logic,
            s.relevance,
            s.persuasiveness,
            s.total()
        );
    }
    let _ = writeln!(
        out,
        "- Overall: logic {:.2}, relevance {:.2}, persuasiveness {:.2}, total {:.2}\n",
        overall.logic,
        overall.relevance,
        overall.persuasiveness,
        p.overall.total()
    );
}

fn judgment_prompt(request: &JudgmentRequest) -> String {
    let mut prompt = format!(
        "You are an expert debate judge. The debate topic was: \"{}\".\n\n",
        request.topic
    );
    write_summary(&mut prompt, "Player 1", &request.participant1);
    write_summary(&mut prompt, "Player 2", &request.participant2);
    let _ = write!(
        prompt,
        "Based on the scores, declare the winner and explain why. Use the player's exact \
         name, or \"Tie\" if neither prevailed.\n\nRespond with a JSON object with exactly these \
         fields:\n{{\"winner\": \"{}\", \"reason\": \"Explanation for why this player won\"}}",
        request.default_winner
    );
    prompt
}

fn parse_score(content: &str) -> Result<Score, OracleError> {
    #[derive(Deserialize)]
    struct Raw {
        logic: f64,
        relevance: f64,
        persuasiveness: f64,
    }

    let raw: Raw =
        serde_json::from_str(content).map_err(|e| OracleError::Malformed(e.to_string()))?;
    let score = Score::new(raw.logic, raw.relevance, raw.persuasiveness);
    if !score.is_valid() {
        return Err(OracleError::Malformed(format!("score out of range: {score:?}")));
    }
    Ok(score)
}

fn parse_judgment(content: &str) -> Result<Judgment, OracleError> {
    serde_json::from_str(content).map_err(|e| OracleError::Malformed(e.to_string()))
}

fn parse_topics(content: &str) -> Result<Vec<String>, OracleError> {
    #[derive(Deserialize)]
    struct Raw {
        topics: Vec<String>,
    }

    let raw: Raw =
        serde_json::from_str(content).map_err(|e| OracleError::Malformed(e.to_string()))?;
    let topics: Vec<String> = raw
        .topics
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if topics.len() != TOPICS_PER_GENRE {
        return Err(OracleError::Malformed(format!(
            "expected {} topics, got {}",
            TOPICS_PER_GENRE,
            topics.len()
        )));
    }
    Ok(topics)
}
