use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which hosted model API the LLM client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenAi,
    Gemini,
}

impl LlmProvider {
    /// Model used when `DEFAULT_MODEL` is not set.
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "claude-sonnet-4-5",
            LlmProvider::OpenAi => "gpt-4o",
            LlmProvider::Gemini => "gemini-1.5-pro",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(LlmProvider::Anthropic),
            "openai" => Ok(LlmProvider::OpenAi),
            "gemini" => Ok(LlmProvider::Gemini),
            other => bail!("Unsupported LLM provider: {other}"),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Gemini => "gemini",
        };
        f.write_str(name)
    }
}

/// Weights the final scorer applies to the three evaluator scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub skills: f64,
    pub experience: f64,
    pub culture: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skills: 0.4,
            experience: 0.4,
            culture: 0.2,
        }
    }
}

impl FromStr for ScoringWeights {
    type Err = anyhow::Error;

    /// Parses `skills,experience,culture`, e.g. `0.4,0.4,0.2`.
    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<f64>()
                    .with_context(|| format!("invalid weight '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        let [skills, experience, culture] = parts[..] else {
            bail!("SCORE_WEIGHTS must have exactly three comma-separated values");
        };

        let weights = Self {
            skills,
            experience,
            culture,
        };
        weights.check()?;
        Ok(weights)
    }
}

impl ScoringWeights {
    /// Weighted sum of the three evaluator scores, clamped to `[0, 1]`.
    /// Weighted overall score, rounded to two decimals so that banding sees
    /// the same value the report shows.
    pub fn combine(&self, skills: f64, experience: f64, culture: f64) -> f64 {
        let sum = self.skills * skills + self.experience * experience + self.culture * culture;
        ((sum * 100.0).round() / 100.0).clamp(0.0, 1.0)
    }

    fn check(&self) -> Result<()> {
        if [self.skills, self.experience, self.culture]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            bail!("score weights must be non-negative numbers");
        }
        let sum = self.skills + self.experience + self.culture;
        if (sum - 1.0).abs() > 1e-6 {
            bail!("score weights must sum to 1.0 (got {sum})");
        }
        Ok(())
    }
}

/// Process configuration, read once at startup and passed by reference into
/// the LLM client and every stage constructor.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub max_tokens: u32,
    pub weights: ScoringWeights,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("DEFAULT_LLM_PROVIDER") {
            Some(raw) => raw.parse()?,
            None => LlmProvider::Anthropic,
        };

        Self::with_provider(provider, lookup)
    }

    /// Same as [`Config::from_lookup`] but with the provider already chosen
    /// (e.g. by a CLI flag).
    pub fn with_provider<F>(provider: LlmProvider, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_var = provider.api_key_var();
        let api_key = lookup(key_var)
            .filter(|k| !k.trim().is_empty())
            .with_context(|| format!("Required environment variable '{key_var}' is not set"))?;

        Ok(Config {
            provider,
            model: lookup("DEFAULT_MODEL")
                .unwrap_or_else(|| provider.default_model().to_string()),
            api_key,
            temperature: parse_or(&lookup, "TEMPERATURE", 0.4)?,
            timeout_seconds: parse_or(&lookup, "TIMEOUT_SECONDS", 60)?,
            max_retries: parse_or(&lookup, "MAX_RETRIES", 3)?,
            max_tokens: parse_or(&lookup, "MAX_TOKENS", 4096)?,
            weights: match lookup("SCORE_WEIGHTS") {
                Some(raw) => raw.parse().context("SCORE_WEIGHTS is invalid")?,
                None => ScoringWeights::default(),
            },
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number")),
        None => Ok(default),
    }
}
