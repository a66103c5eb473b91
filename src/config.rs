//! Client timing configuration
//!
//! The server decides what each round contains and how long its question and
//! answering windows last. The values here cover the parts of the timeline
//! every client fixes locally: the grace window before the host asks for the
//! reveal, and the cadence of the "time left" display.

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::timing;

type ValidationResult = garde::Result;

/// Validates that a duration falls within the inclusive bounds in seconds
pub(crate) fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    field: &'static str,
    val: &Duration,
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) && val.subsec_nanos() == 0 {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "{field} is outside of the bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

fn validate_grace(val: &Duration) -> ValidationResult {
    validate_duration::<{ timing::MIN_GRACE }, { timing::MAX_GRACE }>("grace", val)
}

fn validate_countdown_tick(val: &Duration) -> ValidationResult {
    validate_duration::<{ timing::MIN_COUNTDOWN_TICK }, { timing::MAX_COUNTDOWN_TICK }>(
        "countdown_tick",
        val,
    )
}

/// Locally fixed timing of a client's phase state machine
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Length of the grace phase between answering closing and the host's reveal intent
    #[garde(custom(|v, _| validate_grace(v)))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub grace: Duration,
    /// Interval between countdown display ticks
    #[garde(custom(|v, _| validate_countdown_tick(v)))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub countdown_tick: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(timing::DEFAULT_GRACE),
            countdown_tick: Duration::from_secs(timing::DEFAULT_COUNTDOWN_TICK),
        }
    }
}

/// Errors raised while loading a configuration
#[derive(Error, Debug)]
pub enum Error {
    /// The text is not a configuration object
    #[error("configuration is malformed")]
    Format(#[from] serde_json::Error),
    /// A value is outside its allowed bounds
    #[error("configuration is invalid: {0}")]
    Invalid(String),
}

impl ClientConfig {
    /// Parses and validates a JSON configuration; missing fields keep their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or a value is out of bounds.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config
            .validate()
            .map_err(|report| Error::Invalid(report.to_string()))?;
        Ok(config)
    }
}
