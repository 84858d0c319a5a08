//! External answer judge and hint generator

use crate::llm::{GenerateRequest, LlmError, LlmProvider, LlmResult};
use crate::matcher::normalize_loose;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Shown whenever no usable hint could be produced
pub const HINT_UNAVAILABLE_MESSAGE: &str = "Hint unavailable.";
/// Token the model is told to emit when it cannot comply
pub const HINT_UNAVAILABLE_TOKEN: &str = "HINT_UNAVAILABLE";
pub const MAX_HINT_CHARS: usize = 180;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_correct: bool,
    pub reason: String,
}

impl Verdict {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            is_correct: false,
            reason: reason.into(),
        }
    }
}

/// Natural-language judge consulted for near-miss guesses and hints
#[async_trait]
pub trait JudgeService: Send + Sync {
    /// Raw hint text; sanitation happens in the caller
    async fn generate_hint(&self, question: &str, answer: &str, timeout: Duration)
        -> LlmResult<String>;

    async fn validate_answer(
        &self,
        question: &str,
        canonical_answer: &str,
        guess: &str,
        timeout: Duration,
    ) -> LlmResult<Verdict>;
}

const HINT_SYSTEM_PROMPT: &str = "You are a trivia hint generator.
Rules:
- Do NOT reveal the answer directly.
- Do NOT include the answer, even partially.
- Provide ONE helpful hint, aimed at a player.
- Keep it short (<= 160 characters).
- No quotes, no extra commentary.
- If you cannot comply, output exactly: HINT_UNAVAILABLE";

const VALIDATION_SYSTEM_PROMPT: &str = "You are a strict trivia answer judge.
You will be given a trivia question, the canonical correct answer, and a player's guess.
Decide whether the guess should be accepted as correct.
Accept when:
- The guess is the same answer with different casing, punctuation, missing/extra spaces.
- Minor spelling errors/typos that clearly refer to the same answer.
- Common abbreviations or well-known equivalent names (e.g., USA vs United States).
Reject when:
- The guess is a different entity/meaning.
- The guess is only a partial answer unless the canonical answer is itself partial.
Output MUST be valid JSON with keys: isCorrect (boolean), reason (string).
No extra keys, no markdown.";

/// Judge backed by a chat-completion provider
pub struct LlmJudge {
    provider: Arc<dyn LlmProvider>,
}

impl LlmJudge {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl JudgeService for LlmJudge {
    async fn generate_hint(
        &self,
        question: &str,
        answer: &str,
        timeout: Duration,
    ) -> LlmResult<String> {
        let prompt = format!(
            "Question:\n{}\n\nAnswer (hidden from players; DO NOT reveal):\n{}\n\nReturn only the hint text.",
            question.trim(),
            answer.trim()
        );
        let response = self
            .provider
            .generate(GenerateRequest {
                system: HINT_SYSTEM_PROMPT.to_string(),
                prompt,
                temperature: 0.2,
                max_tokens: 140,
                timeout,
            })
            .await?;
        tracing::debug!(
            "Hint generated by {}/{} in {}ms",
            response.metadata.provider,
            response.metadata.model,
            response.metadata.latency_ms
        );
        Ok(response.text)
    }

    async fn validate_answer(
        &self,
        question: &str,
        canonical_answer: &str,
        guess: &str,
        timeout: Duration,
    ) -> LlmResult<Verdict> {
        let payload = serde_json::json!({
            "question": question.trim(),
            "canonicalAnswer": canonical_answer.trim(),
            "playerGuess": guess.trim(),
        });
        let response = self
            .provider
            .generate(GenerateRequest {
                system: VALIDATION_SYSTEM_PROMPT.to_string(),
                prompt: format!("Decide if playerGuess is correct.\n\n{}", payload),
                temperature: 0.0,
                max_tokens: 120,
                timeout,
            })
            .await?;
        parse_validation(&response.text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidationPayload {
    is_correct: Option<bool>,
    #[serde(default)]
    reason: String,
}

/// Parse the judge's JSON verdict. Tolerates a surrounding markdown code fence.
pub fn parse_validation(raw: &str) -> LlmResult<Verdict> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LlmError::ParseError("empty response".to_string()));
    }
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let payload: ValidationPayload =
        serde_json::from_str(body).map_err(|e| LlmError::ParseError(e.to_string()))?;
    let is_correct = payload
        .is_correct
        .ok_or_else(|| LlmError::ParseError("missing isCorrect".to_string()))?;

    Ok(Verdict {
        is_correct,
        reason: payload.reason,
    })
}

/// Clean a generated hint before anyone sees it.
///
/// Blank or refusal output becomes the unavailable message; a hint whose loose form contains
/// the loose answer is suppressed entirely.
pub fn sanitize_hint(raw: &str, answer: &str) -> String {
    let hint = raw.trim();
    if hint.is_empty() || hint.eq_ignore_ascii_case(HINT_UNAVAILABLE_TOKEN) {
        return HINT_UNAVAILABLE_MESSAGE.to_string();
    }

    let loose_answer = normalize_loose(answer);
    if !loose_answer.is_empty() && normalize_loose(hint).contains(&loose_answer) {
        tracing::warn!("Generated hint leaked the answer; suppressed");
        return HINT_UNAVAILABLE_MESSAGE.to_string();
    }

    if hint.chars().count() > MAX_HINT_CHARS {
        return hint
            .chars()
            .take(MAX_HINT_CHARS)
            .collect::<String>()
            .trim()
            .to_string();
    }
    hint.to_string()
}

/// Stand-in used when no provider could be built; every call fails fast
pub struct UnavailableJudge {
    reason: String,
}

impl UnavailableJudge {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl JudgeService for UnavailableJudge {
    async fn generate_hint(
        &self,
        _question: &str,
        _answer: &str,
        _timeout: Duration,
    ) -> LlmResult<String> {
        Err(LlmError::ConfigError(self.reason.clone()))
    }

    async fn validate_answer(
        &self,
        _question: &str,
        _canonical_answer: &str,
        _guess: &str,
        _timeout: Duration,
    ) -> LlmResult<Verdict> {
        Err(LlmError::ConfigError(self.reason.clone()))
    }
}
