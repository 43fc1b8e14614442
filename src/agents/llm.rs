//! C4 — LLM decision pipeline. Sends a built [`Prompt`] to an [`LlmGateway`]
//! collaborator, preferring structured output and falling back to a strict
//! line-based text format when the gateway (or the model behind it) doesn't support
//! it, then hands the result to C6 for validation. `HandMemory` is updated only
//! after the Rules Engine has actually applied the action — this module never
//! mutates memory itself.
//!
//! Diagnostics go through `log`, matching this crate's style elsewhere; the
//! gateway-call / parse / fallback shape is adapted from a tool-dispatch turn loop.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::entities::{Action, Chips};
use crate::error::AgentError;

use super::{Decision, DecisionContext};
use super::prompt::Prompt;

/// The out-of-scope collaborator: anything that can turn a rendered prompt into a
/// decision, either as a schema-validated object or as raw text. Implementations own
/// their own HTTP client, retries, and auth — none of that is this crate's concern.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Ask the model to answer against `schema`. Returns `AgentError::Unsupported`
    /// when the model/gateway combination can't do structured output at all, which
    /// C4 treats as a signal to fall back to [`Self::complete_text`] rather than a
    /// hard failure.
    async fn complete_structured(&self, model_id: &str, prompt: &str, schema: &Value) -> Result<Value, AgentError>;

    async fn complete_text(&self, model_id: &str, prompt: &str) -> Result<String, AgentError>;
}

#[derive(Debug, Deserialize)]
struct StructuredResponse {
    action: String,
    amount: Option<Chips>,
    reasoning: Option<String>,
    confidence: Option<f32>,
}

fn decision_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "action": {"type": "string", "enum": ["fold", "check", "call", "raise"]},
            "amount": {"type": "integer"},
            "reasoning": {"type": "string"},
            "confidence": {"type": "number"},
        },
        "required": ["action"],
    })
}

/// Runs the full C4 pipeline for one seat's turn: build the prompt, try structured
/// output, fall back to text, parse the result. Does not validate or apply the
/// result — that's C6 and the orchestrator's job.
pub async fn decide(gateway: &dyn LlmGateway, ctx: &DecisionContext, model_id: &str, personality: &str) -> Result<Decision, AgentError> {
    let prompt = super::prompt::build(ctx, personality);
    match gateway.complete_structured(model_id, &prompt.text, &decision_schema()).await {
        Ok(value) => {
            let structured: StructuredResponse =
                serde_json::from_value(value).map_err(|e| AgentError::SchemaValidation(e.to_string()))?;
            from_structured(structured, ctx)
        }
        Err(AgentError::Unsupported(reason)) => {
            log::debug!("seat {} llm gateway has no structured mode ({reason}), falling back to text", ctx.seat);
            let raw = gateway.complete_text(model_id, &prompt.text).await?;
            parse_text_fallback(&raw, ctx)
        }
        Err(other) => Err(other),
    }
}

fn from_structured(resp: StructuredResponse, ctx: &DecisionContext) -> Result<Decision, AgentError> {
    let kind = resp.action.to_lowercase();
    let action = match kind.as_str() {
        "fold" => Action::Fold,
        "check" => Action::Check,
        "call" => Action::Call,
        "raise" => {
            let amount = resp.amount.ok_or_else(|| AgentError::SchemaValidation("raise requires amount".to_string()))?;
            Action::Raise { amount: normalize_raise_amount(ctx, amount) }
        }
        other => return Err(AgentError::SchemaValidation(format!("unknown action \"{other}\""))),
    };
    Ok(Decision { action, reasoning: resp.reasoning, confidence: resp.confidence })
}

/// Parses the rigid text-mode contract: one `ACTION:` line (required), and optional
/// `AMOUNT:`, `REASONING:`, `CONFIDENCE:` lines. Any action token other than the four
/// listed is a parse failure — this mode exists for models without structured output,
/// not as a place to relax the contract with fuzzy matching.
fn parse_text_fallback(raw: &str, ctx: &DecisionContext) -> Result<Decision, AgentError> {
    let mut action_token = None;
    let mut amount = None;
    let mut reasoning = None;
    let mut confidence = None;

    for line in raw.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("ACTION:") {
            action_token = Some(rest.trim().to_lowercase());
        } else if let Some(rest) = line.strip_prefix("AMOUNT:") {
            amount = rest.trim().parse::<Chips>().ok();
        } else if let Some(rest) = line.strip_prefix("REASONING:") {
            reasoning = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("CONFIDENCE:") {
            confidence = rest.trim().parse::<f32>().ok();
        }
    }

    let action = match action_token.as_deref() {
        Some("fold") => Action::Fold,
        Some("check") => Action::Check,
        Some("call") => Action::Call,
        Some("raise") => {
            let amount = amount.ok_or_else(|| AgentError::ParseFailure("ACTION: raise with no AMOUNT line".to_string()))?;
            Action::Raise { amount: normalize_raise_amount(ctx, amount) }
        }
        Some(other) => return Err(AgentError::ParseFailure(format!("unrecognized ACTION token \"{other}\""))),
        None => return Err(AgentError::ParseFailure(format!("no ACTION: line in: {raw}"))),
    };

    Ok(Decision { action, reasoning, confidence })
}

/// LLMs frequently answer "raise by X" instead of the contract's "raise to total X".
/// If `amount` looks like a delta over the call price rather than a new total
/// (heuristic: it's less than `chips_to_call`), rewrite it to `chips_to_call +
/// amount` — the validator (C6) still clamps the result, so a wrong guess here is
/// never worse than falling back to the ladder.
fn normalize_raise_amount(ctx: &DecisionContext, amount: Chips) -> Chips {
    if amount < ctx.analysis.chips_to_call {
        ctx.analysis.chips_to_call + amount
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{HandAnalysis, Position};
    use crate::entities::{ActionKind, AvailableMoves};

    fn ctx() -> DecisionContext {
        DecisionContext {
            seat: 0,
            hand_number: 1,
            board: vec![],
            hole_cards: None,
            pot_total: 100,
            analysis: HandAnalysis { strength_percentile: 0.6, pot_odds: 0.2, position: Position::Late, chips_to_call: 40, effective_stack: 500 },
            moves: AvailableMoves { legal: vec![ActionKind::Fold, ActionKind::Call, ActionKind::Raise], raise_range: Some((80, 1000)) },
            memory: vec![],
        }
    }

    #[test]
    fn structured_response_maps_to_action() {
        let resp = StructuredResponse { action: "raise".into(), amount: Some(150), reasoning: Some("strong hand".into()), confidence: Some(0.9) };
        let decision = from_structured(resp, &ctx()).unwrap();
        assert_eq!(decision.action, Action::Raise { amount: 150 });
        assert_eq!(decision.reasoning.as_deref(), Some("strong hand"));
    }

    #[test]
    fn rewrites_delta_style_raise_amount() {
        let resp = StructuredResponse { action: "raise".into(), amount: Some(20), reasoning: None, confidence: None };
        let decision = from_structured(resp, &ctx()).unwrap();
        assert_eq!(decision.action, Action::Raise { amount: 60 });
    }

    #[test]
    fn text_fallback_parses_strict_line_format() {
        let raw = "ACTION: call\nREASONING: seems safest\nCONFIDENCE: 0.4\n";
        let decision = parse_text_fallback(raw, &ctx()).unwrap();
        assert_eq!(decision.action, Action::Call);
        assert_eq!(decision.reasoning.as_deref(), Some("seems safest"));
        assert_eq!(decision.confidence, Some(0.4));
    }

    #[test]
    fn text_fallback_raise_reads_amount_line() {
        let raw = "ACTION: raise\nAMOUNT: 150\n";
        let decision = parse_text_fallback(raw, &ctx()).unwrap();
        assert_eq!(decision.action, Action::Raise { amount: 150 });
    }

    #[test]
    fn text_fallback_rewrites_delta_style_amount() {
        let raw = "ACTION: raise\nAMOUNT: 20\n";
        let decision = parse_text_fallback(raw, &ctx()).unwrap();
        assert_eq!(decision.action, Action::Raise { amount: 60 });
    }

    #[test]
    fn text_fallback_rejects_unknown_token() {
        let raw = "ACTION: allin\n";
        assert!(parse_text_fallback(raw, &ctx()).is_err());
    }

    #[test]
    fn text_fallback_requires_action_line() {
        let raw = "I'm not sure what to do here.";
        assert!(parse_text_fallback(raw, &ctx()).is_err());
    }
}
