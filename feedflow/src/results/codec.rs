//! Versioned encoding of the result container.
//!
//! The container is one JSON object:
//!
//! ```json
//! {"format":"feedflow.results","version":1,"count":2,"records":[
//!   {"product":{"id":"1"},"description":{"en":{"title":"A","description":"B"}}},
//!   {"product":{"id":"2"},"description":{}}
//! ]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{FeedflowError, Result};
use crate::transform::Record;

/// Format tag written into every container.
pub const RESULTS_FORMAT: &str = "feedflow.results";

/// Container version written by this build.
pub const RESULTS_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: &'a str,
    version: u32,
    count: usize,
    records: &'a [Record],
}

#[derive(Deserialize)]
struct Envelope {
    count: usize,
    records: Vec<Record>,
}

/// Encodes `records` as a container.
pub fn encode(records: &[Record]) -> Result<String> {
    let envelope = EnvelopeRef {
        format: RESULTS_FORMAT,
        version: RESULTS_VERSION,
        count: records.len(),
        records,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes a container.
///
/// More than one serialized value in `content` violates the single-container
/// invariant and is reported as [`FeedflowError::ResultInvariantViolation`].
pub fn decode(content: &str) -> Result<Vec<Record>> {
    let mut values = serde_json::Deserializer::from_str(content).into_iter::<Value>();
    let envelope = match values.next() {
        Some(Ok(value)) => value,
        Some(Err(e)) => return Err(FeedflowError::CorruptResults(e.to_string())),
        None => return Err(FeedflowError::CorruptResults("container is empty".into())),
    };
    match values.next() {
        None => {}
        Some(Ok(_)) => {
            return Err(FeedflowError::ResultInvariantViolation(
                "results file holds more than one serialized sequence".into(),
            ))
        }
        Some(Err(e)) => return Err(FeedflowError::CorruptResults(e.to_string())),
    }

    if envelope.get("format").and_then(Value::as_str) != Some(RESULTS_FORMAT) {
        return Err(FeedflowError::CorruptResults("missing or unknown format tag".into()));
    }
    let version = envelope
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| FeedflowError::CorruptResults("missing version".into()))?;
    if version != RESULTS_VERSION {
        return Err(FeedflowError::UnsupportedResultsVersion {
            found: version,
            expected: RESULTS_VERSION,
        });
    }

    let envelope: Envelope = serde_json::from_value(envelope)
        .map_err(|e| FeedflowError::CorruptResults(e.to_string()))?;
    if envelope.count != envelope.records.len() {
        return Err(FeedflowError::CorruptResults(format!(
            "count {} does not match {} records",
            envelope.count,
            envelope.records.len()
        )));
    }
    Ok(envelope.records)
}
