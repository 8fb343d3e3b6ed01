//! # Pipeline Settings
//!
//! Pacing and batching settings for the CLI. Every field has a default, so an empty
//! configuration source deserializes into the stock pacing and batching.

use crate::{preload::PreloadOptions, providers::jikan::RateLimit};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// All tunables of the cover pipeline in one place.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub rate_limit: RateLimit,
    pub preload: PreloadOptions,
}

/// Deserializes a `Duration` from a plain number of milliseconds.
pub(crate) fn deserialize_millis<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Duration, D::Error> {
    Ok(Duration::from_millis(u64::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings: PipelineSettings = serde_json::from_value(json!({
            "rate_limit": { "request_delay": 250 },
            "preload": { "batch_size": 10 }
        }))
        .unwrap();

        assert_eq!(settings.rate_limit.request_delay, Duration::from_millis(250));
        assert_eq!(settings.rate_limit.throttle_delay, Duration::from_millis(5000));
        assert_eq!(settings.preload.batch_size, 10);
        assert_eq!(settings.preload.batch_delay, Duration::from_millis(5000));
    }
}
