//! Structured-response parsing
//!
//! Model output is not guaranteed to be only JSON. The object is taken from
//! the first `{` to the last `}` of the text; anything that cannot be parsed
//! from that slice yields the caller's fallback unchanged.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Slice from the first `{` through the last `}`, if they form a pair
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        debug!(%start, %end, "extract_json_object: closing brace precedes opening brace");
        return None;
    }
    Some(&raw[start..=end])
}

/// Parse the brace-delimited object in `raw` as `T`, or return `fallback`
pub fn parse_json<T: DeserializeOwned>(raw: &str, fallback: T) -> T {
    try_parse_json(raw).unwrap_or(fallback)
}

/// Parse the brace-delimited object in `raw` as `T`; None when there is none or it does not fit
pub fn try_parse_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    debug!(raw_len = raw.len(), "try_parse_json: called");
    let Some(candidate) = extract_json_object(raw) else {
        warn!("try_parse_json: no JSON object in response");
        return None;
    };

    match serde_json::from_str::<T>(candidate) {
        Ok(value) => {
            debug!("try_parse_json: parsed");
            Some(value)
        }
        Err(e) => {
            warn!(error = %e, "try_parse_json: invalid JSON object");
            None
        }
    }
}
