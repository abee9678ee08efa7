// src/tokens.rs
// Token counting and session budget classification

use once_cell::sync::Lazy;
use serde::Serialize;
use thiserror::Error;
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// Default per-session budget when a project does not configure one
pub const DEFAULT_MAX_TOKENS: u64 = 15_000;

/// Usage at or above this percentage moves a session into the warn band
pub const WARN_PERCENT: f64 = 60.0;

/// Usage at or above this percentage moves a session into the break band
pub const BREAK_PERCENT: f64 = 80.0;

/// Approximate characters per token for the fallback estimate
const CHARS_PER_TOKEN: usize = 4;

/// gpt-4 encoding, built once on first use
static CL100K: Lazy<Result<CoreBPE, String>> = Lazy::new(|| {
    tiktoken_rs::cl100k_base().map_err(|e| {
        warn!(error = %e, "cl100k_base encoding unavailable");
        e.to_string()
    })
});

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("tokenizer unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can turn text into a token count
pub trait Tokenizer: Send + Sync {
    fn count(&self, text: &str) -> Result<usize, TokenizerError>;
}

/// BPE tokenizer using the cl100k_base vocabulary
#[derive(Debug, Default, Clone, Copy)]
pub struct Cl100kTokenizer;

impl Tokenizer for Cl100kTokenizer {
    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        let bpe = CL100K
            .as_ref()
            .map_err(|e| TokenizerError::Unavailable(e.clone()))?;
        Ok(bpe.encode_with_special_tokens(text).len())
    }
}

/// Which way a session should go given its token consumption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UsageBand {
    Continue,
    Warn,
    Break,
}

impl UsageBand {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenUsage {
    pub current: u64,
    pub limit: u64,
    pub percentage: u64,
    pub suggestion: UsageBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SuggestedAction {
    EndSession,
    CreateCheckpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakSuggestion {
    pub reason: String,
    pub current_tokens: u64,
    pub suggested_action: SuggestedAction,
    pub summary: String,
}

/// Counts tokens and carries the server-wide default budget
pub struct TokenCounter {
    tokenizer: Option<Box<dyn Tokenizer>>,
    default_limit: u64,
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS)
    }
}

impl TokenCounter {
    pub fn new(default_limit: u64) -> Self {
        Self::with_tokenizer(Box::new(Cl100kTokenizer), default_limit)
    }

    pub fn with_tokenizer(tokenizer: Box<dyn Tokenizer>, default_limit: u64) -> Self {
        Self {
            tokenizer: Some(tokenizer),
            default_limit,
        }
    }

    /// Counter that always uses the character estimate
    pub fn estimate_only(default_limit: u64) -> Self {
        Self {
            tokenizer: None,
            default_limit,
        }
    }

    pub fn default_limit(&self) -> u64 {
        self.default_limit
    }

    /// Count tokens in `text`, falling back to `ceil(chars / 4)` if the tokenizer fails
    pub fn count_tokens(&self, text: &str) -> u64 {
        if text.is_empty() {
            return 0;
        }
        let counted = match &self.tokenizer {
            Some(tokenizer) => tokenizer.count(text),
            None => Err(TokenizerError::Unavailable("no tokenizer configured".into())),
        };
        match counted {
            Ok(n) => n as u64,
            Err(e) => {
                debug!(error = %e, "Tokenizer failed, using character estimate");
                estimate_tokens(text)
            }
        }
    }
}

/// Rough estimate: ~4 characters per token, at least 1 for non-empty text
pub fn estimate_tokens(text: &str) -> u64 {
    text.chars().count().div_ceil(CHARS_PER_TOKEN) as u64
}

/// Classify `current` against `limit`.
///
/// The band is chosen on the unrounded percentage, so 59.99% stays in
/// `Continue` even though it is reported as 60. A zero limit counts as
/// fully used.
pub fn get_usage(current: u64, limit: u64) -> TokenUsage {
    let raw = if limit == 0 {
        100.0
    } else {
        current as f64 / limit as f64 * 100.0
    };

    let suggestion = if raw < WARN_PERCENT {
        UsageBand::Continue
    } else if raw < BREAK_PERCENT {
        UsageBand::Warn
    } else {
        UsageBand::Break
    };

    TokenUsage {
        current,
        limit,
        percentage: raw.round().clamp(0.0, 100.0) as u64,
        suggestion,
    }
}

pub fn should_suggest_break(current: u64, limit: u64) -> Option<BreakSuggestion> {
    let usage = get_usage(current, limit);
    match usage.suggestion {
        UsageBand::Continue => None,
        UsageBand::Warn => Some(BreakSuggestion {
            reason: format!("High token usage ({}% used)", usage.percentage),
            current_tokens: current,
            suggested_action: SuggestedAction::CreateCheckpoint,
            summary: "Consider creating a checkpoint or preparing to end session".into(),
        }),
        UsageBand::Break => Some(BreakSuggestion {
            reason: format!("Approaching token limit ({}% used)", usage.percentage),
            current_tokens: current,
            suggested_action: SuggestedAction::EndSession,
            summary: "Consider ending this session to maintain context quality".into(),
        }),
    }
}
