//! Build instruction, call gateway, parse or fall back
//!
//! Every structured component (intent, department, planner) is this same
//! pipeline with a different template and fallback.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::parse::try_parse_json;
use crate::llm::{Gateway, is_error_marker};

/// Confidence attached to every classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

// Models answer "High", "medium " or worse; anything unrecognized is low
impl From<String> for Confidence {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Render `template` with `context`, invoke the gateway as `role`, parse as `T`
///
/// An error marker from the gateway goes straight to the fallback so that an
/// error body that happens to contain JSON is never mistaken for a result.
pub async fn run_classification<T, C>(gateway: &Gateway, template: &str, context: &C, role: &str, fallback: T) -> eyre::Result<T>
where
    T: DeserializeOwned,
    C: Serialize,
{
    Ok(run_structured(gateway, template, context, role).await?.unwrap_or(fallback))
}

/// Like [`run_classification`], but None when the model gave nothing usable
///
/// For callers whose post-processing must not touch a fallback value.
pub async fn run_structured<T, C>(gateway: &Gateway, template: &str, context: &C, role: &str) -> eyre::Result<Option<T>>
where
    T: DeserializeOwned,
    C: Serialize,
{
    debug!(%template, %role, "run_structured: called");
    let instruction = gateway.prompts().render(template, context)?;

    let raw = gateway.invoke(&instruction, role).await;
    if is_error_marker(&raw) {
        warn!(%template, error = %raw, "run_structured: gateway failed");
        return Ok(None);
    }

    let parsed = try_parse_json(&raw);
    if parsed.is_none() {
        warn!(%template, "run_structured: unusable response");
    }
    Ok(parsed)
}
