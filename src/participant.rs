//! Participant identity and roles
//!
//! This module defines who is on the other end of a client: the participant
//! id handed out by the server on a successful join, the role the client
//! plays in the session, and the validation a display name goes through
//! before a join intent is sent.

use std::str::FromStr;

use rustrict::CensorStr;
use serde::{Deserialize, Serialize};
use serde_with::SerializeDisplay;
use thiserror::Error;

use crate::constants::{identifier, name};

/// A participant identifier assigned by the server when a join succeeds
///
/// The value is opaque to the client; it is stored, echoed back with each
/// submission, and compared for leaderboard lookups. Servers send it either
/// as a string or as a plain integer; both deserialize to the same id.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, derive_more::Display,
)]
pub struct ParticipantId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParticipantId {
    Text(String),
    Number(u64),
}

impl<'de> Deserialize<'de> for ParticipantId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawParticipantId::deserialize(deserializer)? {
            RawParticipantId::Text(s) => s.parse().map_err(serde::de::Error::custom),
            RawParticipantId::Number(n) => Ok(n.into()),
        }
    }
}

impl ParticipantId {
    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ParticipantId {
    type Err = crate::session_id::Error;

    /// Parses a participant id
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed string is empty or too long.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err(crate::session_id::Error::Empty)
        } else if s.chars().count() > identifier::MAX_LENGTH {
            Err(crate::session_id::Error::TooLong)
        } else {
            Ok(Self(s.to_owned()))
        }
    }
}

impl From<u64> for ParticipantId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// The role a client plays in a session
///
/// Host and player run the same phase state machine; the role only decides
/// which further intents the client may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Starts the session, advances questions and asks for the reveal
    Host,
    /// Answers questions
    Player,
}

impl Role {
    /// Whether this role emits the reveal intent when its grace timer fires
    pub fn reveals(self) -> bool {
        matches!(self, Role::Host)
    }

    /// Whether this role may submit answers
    pub fn answers(self) -> bool {
        matches!(self, Role::Player)
    }
}

/// Errors that can occur during name validation
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Sinful,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
}

/// Cleans up and validates a display name before it is sent with a join
///
/// # Errors
///
/// * `NameError::TooLong` - Name exceeds the maximum length
/// * `NameError::Empty` - Name is empty after trimming whitespace
/// * `NameError::Sinful` - Name contains inappropriate content
pub fn validate_name(name: &str) -> Result<String, NameError> {
    let name = rustrict::trim_whitespace(name);
    if name.chars().count() > name::MAX_LENGTH {
        return Err(NameError::TooLong);
    }
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.is_inappropriate() {
        return Err(NameError::Sinful);
    }
    Ok(name.to_owned())
}
