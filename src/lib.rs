//! # Quizsync
//!
//! Client-side core of a live, multi-participant quiz. A host starts a
//! session and advances through questions; players join with a name and
//! answer; the server pushes each round to everyone. Every connected client
//! replays the round's timeline locally with its own phase state machine,
//! and all of them reveal the answer on the same server broadcast.
//!
//! The crate owns no transport. Server pushes come in as [`Push`] values and
//! the client's outgoing [`Intent`]s go out through a [`channel::Channel`].

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};

pub mod channel;
pub mod config;
pub mod constants;
pub mod identity;
pub mod leaderboard;
pub mod participant;
pub mod phase;
pub mod round;
pub mod runtime;
pub mod session_id;
pub mod submission;
pub mod timer;
pub mod view;

use leaderboard::WinnerEntry;
use participant::ParticipantId;
use round::RoundPush;
use session_id::{QuizId, SessionId};

/// Acknowledgement of a successful join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinAccepted {
    /// The session joined; absent when the server echoes nothing back
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// The participant id assigned to this client
    #[serde(alias = "userId")]
    pub participant_id: ParticipantId,
}

/// Acknowledgement of a host's start intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStarted {
    /// The new session
    pub session_id: SessionId,
    /// A short code players can type instead of the session id
    #[serde(default)]
    pub code: Option<SessionId>,
}

/// Messages the server pushes to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum Push {
    /// A new question round begins
    #[serde(rename = "next-question")]
    RoundPushed(RoundPush),
    /// The correct answer of the current round may be shown
    #[serde(rename = "reveal-answer")]
    AnswerRevealed,
    /// The quiz has no more questions
    QuizEnded,
    /// Current ranking of every participant
    #[serde(rename = "winners")]
    WinnersPushed(Vec<WinnerEntry>),
    /// A join intent was accepted
    Joined(JoinAccepted),
    /// A join intent was declined
    JoinRejected {
        /// Reason given by the server
        message: String,
    },
    /// A start intent was accepted
    SessionStarted(SessionStarted),
    /// The quiz or session the host referenced does not exist
    #[serde(rename = "invalid-quiz-id")]
    InvalidSession,
}

impl Push {
    /// Parses a push received as JSON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a known push.
    pub fn from_message(message: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(message)
    }
}

/// Messages a client sends to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum Intent {
    /// Join a session as a player, or rejoin with a stored identity
    #[serde(rename = "join-quiz", rename_all = "camelCase")]
    Join {
        /// Session to join
        session_id: SessionId,
        /// Display name, absent when rejoining
        #[serde(default, skip_serializing_if = "Option::is_none")]
        participant_name: Option<String>,
    },
    /// Follow a session as its host
    #[serde(rename = "join-quiz-host", rename_all = "camelCase")]
    HostJoin {
        /// Session to follow
        session_id: SessionId,
    },
    /// Start a new session of a quiz
    #[serde(rename = "start-quiz", rename_all = "camelCase")]
    StartSession {
        /// Quiz to run
        quiz_id: QuizId,
    },
    /// Push the next question to everyone
    #[serde(rename = "next-question", rename_all = "camelCase")]
    AdvanceQuestion {
        /// Session to advance
        session_id: SessionId,
    },
    /// Reveal the current answer to everyone
    #[serde(rename = "reveal-answer", rename_all = "camelCase")]
    RevealAnswer {
        /// Session to reveal in
        session_id: SessionId,
    },
    /// Submit an answer for the current round
    #[serde(rename = "submit-answer", rename_all = "camelCase")]
    SubmitAnswer {
        /// Session the round belongs to
        session_id: SessionId,
        /// Who is answering
        #[serde(rename = "userId")]
        participant_id: ParticipantId,
        /// Index of the chosen option
        #[serde(rename = "answer")]
        option_index: usize,
    },
    /// Ask for the current ranking
    #[serde(rename = "retrieve-winners", rename_all = "camelCase")]
    RetrieveWinners {
        /// Session to rank
        session_id: SessionId,
    },
}

impl Intent {
    /// Converts the intent to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}
