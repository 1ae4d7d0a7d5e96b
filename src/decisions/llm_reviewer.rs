//! Optional LLM batch reviewer (spec §4.5). A single prompt carries the
//! cart, detected bundles, items under review, and items already kept;
//! the model calls `make_prune_decision` once per reviewed item. Final
//! decision is the LLM's when its confidence clears the configured
//! threshold, else the heuristic decision stands — the LLM never sits in
//! a control path beyond accept/reject advice.

use crate::models::{CartItem, CoPurchaseEdge, PruneDecision};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmAction {
    Prune,
    Keep,
}

impl LlmAction {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRUNE" => Some(Self::Prune),
            "KEEP" => Some(Self::Keep),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedPruneAdvice {
    pub identity: String,
    pub action: LlmAction,
    pub confidence: f64,
    pub rationale: Option<String>,
}

/// Parses one `make_prune_decision` tool call payload in a small
/// `KEY=VALUE` DSL, one key per line.
pub fn parse_prune_advice(raw: &str) -> Result<ParsedPruneAdvice> {
    let mut identity: Option<String> = None;
    let mut action: Option<LlmAction> = None;
    let mut confidence: Option<f64> = None;
    let mut rationale: Option<String> = None;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let key = k.trim().to_ascii_uppercase();
        let val = v.trim();

        match key.as_str() {
            "IDENTITY" => {
                if !val.is_empty() {
                    identity = Some(val.to_string());
                }
            }
            "ACTION" => action = LlmAction::parse(val),
            "CONFIDENCE" => {
                confidence = val
                    .parse::<f64>()
                    .ok()
                    .filter(|x| x.is_finite())
                    .map(|x| x.clamp(0.0, 1.0));
            }
            "RATIONALE" => {
                if !val.is_empty() {
                    rationale = Some(val.chars().take(240).collect());
                }
            }
            _ => return Err(anyhow!("unknown key in prune advice dsl: {key}")),
        }
    }

    let identity = identity.ok_or_else(|| anyhow!("missing IDENTITY"))?;
    let action = action.ok_or_else(|| anyhow!("missing ACTION"))?;
    let confidence = confidence.ok_or_else(|| anyhow!("missing CONFIDENCE"))?;

    Ok(ParsedPruneAdvice {
        identity,
        action,
        confidence,
        rationale,
    })
}

/// Blends LLM advice over heuristic decisions: the LLM wins only when its
/// confidence clears `threshold`.
pub fn apply_llm_advice(
    heuristic: Vec<PruneDecision>,
    advice: &[ParsedPruneAdvice],
    threshold: f64,
) -> Vec<PruneDecision> {
    heuristic
        .into_iter()
        .map(|decision| {
            let Some(matched) = advice.iter().find(|a| a.identity == decision.product_identity)
            else {
                return decision;
            };
            if matched.confidence < threshold {
                return decision;
            }
            PruneDecision {
                product_identity: decision.product_identity,
                prune: matched.action == LlmAction::Prune,
                confidence: matched.confidence,
                reason: matched
                    .rationale
                    .clone()
                    .unwrap_or_else(|| "llm reviewer advice".to_string()),
                context: json!({
                    "source": "llm_reviewer",
                    "heuristic_prune": decision.prune,
                    "heuristic_confidence": decision.confidence,
                }),
            }
        })
        .collect()
}

pub fn build_review_prompt(
    cart: &[CartItem],
    bundles: &[Vec<String>],
    under_review: &[PruneDecision],
    already_kept: &[PruneDecision],
) -> String {
    let cart_json = serde_json::to_string(cart).unwrap_or_default();
    let bundles_json = serde_json::to_string(bundles).unwrap_or_default();
    let under_review_json = serde_json::to_string(under_review).unwrap_or_default();
    let kept_json = serde_json::to_string(already_kept).unwrap_or_default();

    format!(
        "Cart: {cart_json}\nBundles: {bundles_json}\nUnder review: {under_review_json}\nAlready kept: {kept_json}\n\
         Call make_prune_decision once per item under review with IDENTITY=, ACTION=PRUNE|KEEP, CONFIDENCE=0..1, RATIONALE=."
    )
}

#[allow(dead_code)]
pub fn co_purchase_summary(edges: &[CoPurchaseEdge]) -> String {
    edges
        .iter()
        .map(|e| format!("{}(lift={:.2})", e.product_identity, e.lift))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone)]
pub struct LlmCallOutput {
    pub model: String,
    pub content: String,
    pub latency_ms: u64,
}

/// Thin OpenRouter-style chat-completion client; only used when the
/// operator has opted into LLM-assisted review.
#[derive(Clone)]
pub struct PruneReviewerClient {
    http: reqwest::Client,
    api_key: String,
}

impl PruneReviewerClient {
    pub fn from_env(http: reqwest::Client) -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .context("OPENROUTER_API_KEY missing (set env var)")?;
        if api_key.trim().is_empty() {
            return Err(anyhow!("OPENROUTER_API_KEY empty"));
        }
        Ok(Self { http, api_key })
    }

    pub async fn review(
        &self,
        model: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<LlmCallOutput> {
        let start = Instant::now();

        let req = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You advise on which cart items to prune. You never place orders."
                        .to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.0,
            max_tokens: 1024,
        };

        let resp = self
            .http
            .post("https://openrouter.ai/api/v1/chat/completions")
            .timeout(timeout)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&req)
            .send()
            .await
            .context("openrouter request")?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let snippet: String = body.chars().take(800).collect();
            return Err(anyhow!("openrouter {}: {}", status.as_u16(), snippet));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).context("openrouter json parse")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content)
            .unwrap_or_default();

        Ok(LlmCallOutput {
            model: model.to_string(),
            content,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageOut>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageOut {
    content: String,
}
