//! Session and quiz identifiers
//!
//! Session ids (or the short codes the host shares) and quiz ids are opaque
//! strings minted by the server. Locally they are only trimmed and bounded so
//! that a blank route segment or a pasted paragraph never reaches the wire.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

use crate::constants::identifier::MAX_LENGTH;

/// Errors produced when parsing an identifier
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The identifier is empty or whitespace only
    #[error("identifier cannot be empty")]
    Empty,
    /// The identifier exceeds the maximum length
    #[error("identifier is too long")]
    TooLong,
}

fn clean(s: &str) -> Result<String, Error> {
    let s = s.trim();
    if s.is_empty() {
        Err(Error::Empty)
    } else if s.chars().count() > MAX_LENGTH {
        Err(Error::TooLong)
    } else {
        Ok(s.to_owned())
    }
}

/// Identifies one running quiz session, either by its id or its share code
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    DeserializeFromStr,
    SerializeDisplay,
    derive_more::Display,
)]
pub struct SessionId(String);

impl SessionId {
    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionId {
    type Err = Error;

    /// Parses a session id, trimming surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed string is empty or too long.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        clean(s).map(Self)
    }
}

/// Identifies an authored quiz that a host can start sessions of
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay, derive_more::Display,
)]
pub struct QuizId(String);

impl QuizId {
    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for QuizId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        clean(s).map(Self)
    }
}

/// Lifecycle of a session as observed by one client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Nothing is known about the session yet
    #[default]
    Unknown,
    /// The host's start intent was acknowledged
    Created,
    /// At least one round has been pushed
    Active,
    /// The server announced the end of the quiz
    Ended,
}

impl SessionStatus {
    /// Advances the lifecycle, never moving backwards
    pub fn advance(&mut self, to: SessionStatus) {
        if to > *self {
            *self = to;
        }
    }
}
