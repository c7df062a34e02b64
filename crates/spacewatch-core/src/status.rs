//! Status endpoint client
//!
//! Fetches the SpaceAPI-style feed and extracts the two fields the pipeline
//! cares about: the open/closed flag and the first people-present sensor
//! reading. The feed is loosely typed, so parsing goes through a tolerant
//! `serde_json::Value` walk rather than a rigid struct: the flag is required,
//! everything else degrades to "unknown".

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

/// One observation of the space, produced per poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceStatus {
    /// Whether the space reports itself open
    pub is_open: bool,

    /// People currently present, when the feed carries a usable sensor value.
    /// Only meaningful while open; `None` renders as "?".
    pub people_count: Option<u32>,
}

/// Source of space observations
///
/// The poll loop is written against this seam so tests can drive it with a
/// scripted fake instead of a live endpoint.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Issue one bounded fetch and parse the result
    async fn fetch(&self) -> Result<SpaceStatus>;
}

/// HTTP client for the status endpoint
pub struct StatusClient {
    client: reqwest::Client,
    endpoint: String,
}

impl StatusClient {
    /// Create a client with a hard per-request timeout
    pub fn new(endpoint: impl Into<String>, per_attempt_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(per_attempt_timeout)
            .build()
            .map_err(|e| Error::setup(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// The endpoint URL this client polls
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StatusSource for StatusClient {
    async fn fetch(&self) -> Result<SpaceStatus> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::network(format!("request timed out: {e}"))
                } else {
                    Error::network(format!("request failed: {e}"))
                }
            })?
            .error_for_status()
            .map_err(|e| Error::network(format!("endpoint returned an error status: {e}")))?;

        let body: Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                Error::malformed(format!("body is not valid JSON: {e}"))
            } else {
                Error::network(format!("failed to read body: {e}"))
            }
        })?;

        parse_status(&body)
    }
}

/// Extract a [`SpaceStatus`] from a feed body.
///
/// `state.open` must be present and boolean. The people count comes from the
/// first element of `sensors.people_now_present`; an empty or missing sensor
/// list, or a value that is not an unsigned integer, degrades to `None`
/// rather than failing.
pub fn parse_status(body: &Value) -> Result<SpaceStatus> {
    let is_open = body
        .pointer("/state/open")
        .and_then(Value::as_bool)
        .ok_or_else(|| Error::malformed("state.open is missing or not a boolean"))?;

    let people_count = body
        .pointer("/sensors/people_now_present/0/value")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok());

    Ok(SpaceStatus {
        is_open,
        people_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_open_with_count() {
        let body = json!({
            "state": { "open": true },
            "sensors": { "people_now_present": [ { "value": 3 } ] }
        });

        let status = parse_status(&body).unwrap();
        assert!(status.is_open);
        assert_eq!(status.people_count, Some(3));
    }

    #[test]
    fn test_parse_closed() {
        let body = json!({
            "state": { "open": false },
            "sensors": { "people_now_present": [ { "value": 0 } ] }
        });

        let status = parse_status(&body).unwrap();
        assert!(!status.is_open);
        assert_eq!(status.people_count, Some(0));
    }

    #[test]
    fn test_empty_sensor_list_degrades_to_unknown_count() {
        let body = json!({
            "state": { "open": true },
            "sensors": { "people_now_present": [] }
        });

        let status = parse_status(&body).unwrap();
        assert!(status.is_open);
        assert_eq!(status.people_count, None);
    }

    #[test]
    fn test_missing_sensors_section_degrades_to_unknown_count() {
        let body = json!({ "state": { "open": true } });

        let status = parse_status(&body).unwrap();
        assert_eq!(status.people_count, None);
    }

    #[test]
    fn test_non_integer_sensor_value_degrades_to_unknown_count() {
        let body = json!({
            "state": { "open": true },
            "sensors": { "people_now_present": [ { "value": "three" } ] }
        });

        let status = parse_status(&body).unwrap();
        assert_eq!(status.people_count, None);
    }

    #[test]
    fn test_only_first_sensor_entry_is_read() {
        let body = json!({
            "state": { "open": true },
            "sensors": { "people_now_present": [ { "value": 2 }, { "value": 9 } ] }
        });

        let status = parse_status(&body).unwrap();
        assert_eq!(status.people_count, Some(2));
    }

    #[test]
    fn test_missing_state_open_is_malformed() {
        let body = json!({ "state": {}, "sensors": {} });

        let err = parse_status(&body).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_non_boolean_state_open_is_malformed() {
        let body = json!({ "state": { "open": "yes" } });

        let err = parse_status(&body).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let body = json!({
            "api": "0.13",
            "space": "the space",
            "state": { "open": true, "lastchange": 1700000000 },
            "sensors": { "people_now_present": [ { "value": 1, "location": "inside" } ] }
        });

        let status = parse_status(&body).unwrap();
        assert!(status.is_open);
        assert_eq!(status.people_count, Some(1));
    }
}
