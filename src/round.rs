//! Question rounds
//!
//! A round arrives as a single server push carrying the question, its
//! ordered answer options, the index of the correct option, and how long
//! the question and answering windows last. The push is validated once and
//! turned into an immutable [`Round`] that the phase state machine replays.

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::validate_duration, constants::round};

type ValidationResult = garde::Result;

fn validate_question_duration(val: &Duration) -> ValidationResult {
    validate_duration::<{ round::MIN_QUESTION_DURATION }, { round::MAX_QUESTION_DURATION }>(
        "question_duration",
        val,
    )
}

fn validate_answering_duration(val: &Duration) -> ValidationResult {
    validate_duration::<{ round::MIN_ANSWERING_DURATION }, { round::MAX_ANSWERING_DURATION }>(
        "answering_duration",
        val,
    )
}

/// Timing of a round as pushed by the server
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PushedTiming {
    /// Seconds the question is shown before answering opens
    #[garde(custom(|v, _| validate_question_duration(v)))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub question_duration: Duration,
    /// Seconds answering stays open
    #[garde(custom(|v, _| validate_answering_duration(v)))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub answering_duration: Duration,
}

/// Payload of the round push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoundPush {
    /// The question text
    #[garde(length(chars, max = round::MAX_QUESTION_LENGTH))]
    pub question: String,
    /// Answer options, in display order
    #[garde(
        length(min = round::MIN_OPTION_COUNT, max = round::MAX_OPTION_COUNT),
        inner(length(chars, max = round::MAX_OPTION_LENGTH))
    )]
    pub answers: Vec<String>,
    /// Index of the correct option in `answers`
    #[serde(alias = "correctAnswerIndex")]
    #[garde(skip)]
    pub correct_answer: usize,
    /// Question and answering windows
    #[garde(dive)]
    pub time: PushedTiming,
}

/// Errors that make a round push unusable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A field is outside its allowed bounds
    #[error("round is invalid: {0}")]
    Invalid(String),
    /// The correct option does not exist
    #[error("correct answer {index} is out of range for {count} options")]
    CorrectAnswerOutOfRange {
        /// The pushed correct index
        index: usize,
        /// Number of options in the round
        count: usize,
    },
}

/// Full timeline of one round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Time spent in the displaying phase
    pub question: Duration,
    /// Time spent in the answering phase
    pub answering: Duration,
    /// Time spent in the grace phase before the host asks for the reveal
    pub grace: Duration,
}

/// A validated, immutable question round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    question: String,
    options: Vec<String>,
    correct_option: usize,
    timing: Timing,
}

/// How a client's own answer compares to the revealed one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Feedback {
    /// The submitted option is the correct one
    Correct,
    /// The submitted option is not the correct one
    Incorrect,
    /// Nothing was submitted this round
    Unanswered,
}

impl Round {
    /// Validates a push and completes its timing with the local grace period
    ///
    /// # Errors
    ///
    /// Returns an error if any field is out of bounds or the correct index
    /// does not name an option.
    pub fn from_push(push: RoundPush, grace: Duration) -> Result<Self, Error> {
        push.validate()
            .map_err(|report| Error::Invalid(report.to_string()))?;
        if push.correct_answer >= push.answers.len() {
            return Err(Error::CorrectAnswerOutOfRange {
                index: push.correct_answer,
                count: push.answers.len(),
            });
        }
        Ok(Self {
            question: push.question,
            options: push.answers,
            correct_option: push.correct_answer,
            timing: Timing {
                question: push.time.question_duration,
                answering: push.time.answering_duration,
                grace,
            },
        })
    }

    /// The question text
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The answer options in display order
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Index of the correct option
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    /// The round's timeline
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Whether `option` names one of the round's options
    pub fn has_option(&self, option: usize) -> bool {
        option < self.options.len()
    }

    /// Compares a submitted option against the correct one
    pub fn feedback(&self, submitted: Option<usize>) -> Feedback {
        match submitted {
            Some(option) if option == self.correct_option => Feedback::Correct,
            Some(_) => Feedback::Incorrect,
            None => Feedback::Unanswered,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn create_test_push() -> RoundPush {
        RoundPush {
            question: "Which planet is largest?".to_string(),
            answers: vec![
                "Mars".to_string(),
                "Jupiter".to_string(),
                "Venus".to_string(),
            ],
            correct_answer: 1,
            time: PushedTiming {
                question_duration: Duration::from_secs(3),
                answering_duration: Duration::from_secs(5),
            },
        }
    }

    #[test]
    fn test_push_from_json() {
        let push: RoundPush = serde_json::from_str(
            r#"{"question":"Q","answers":["a","b"],"correctAnswer":1,
                "time":{"questionDuration":3,"answeringDuration":5}}"#,
        )
        .unwrap();
        assert_eq!(push.correct_answer, 1);
        assert_eq!(push.time.question_duration, Duration::from_secs(3));
        assert_eq!(push.time.answering_duration, Duration::from_secs(5));
    }

    #[test]
    fn test_push_accepts_index_alias() {
        let push: RoundPush = serde_json::from_str(
            r#"{"question":"Q","answers":["a","b"],"correctAnswerIndex":0,
                "time":{"questionDuration":0,"answeringDuration":5}}"#,
        )
        .unwrap();
        assert_eq!(push.correct_answer, 0);
    }

    #[test]
    fn test_round_from_push() {
        let round = Round::from_push(create_test_push(), Duration::from_secs(5)).unwrap();
        assert_eq!(round.question(), "Which planet is largest?");
        assert_eq!(round.options().len(), 3);
        assert_eq!(round.correct_option(), 1);
        assert_eq!(
            round.timing(),
            Timing {
                question: Duration::from_secs(3),
                answering: Duration::from_secs(5),
                grace: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn test_round_correct_out_of_range() {
        let mut push = create_test_push();
        push.correct_answer = 3;
        assert_eq!(
            Round::from_push(push, Duration::from_secs(5)),
            Err(Error::CorrectAnswerOutOfRange { index: 3, count: 3 })
        );
    }

    #[test]
    fn test_round_without_options() {
        let mut push = create_test_push();
        push.answers.clear();
        push.correct_answer = 0;
        assert!(matches!(
            Round::from_push(push, Duration::from_secs(5)),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn test_round_too_many_options() {
        let mut push = create_test_push();
        push.answers = vec!["x".to_string(); round::MAX_OPTION_COUNT + 1];
        assert!(Round::from_push(push, Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_round_answering_too_long() {
        let mut push = create_test_push();
        push.time.answering_duration = Duration::from_secs(round::MAX_ANSWERING_DURATION + 1);
        assert!(Round::from_push(push, Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_feedback() {
        let round = Round::from_push(create_test_push(), Duration::from_secs(5)).unwrap();
        assert_eq!(round.feedback(Some(1)), Feedback::Correct);
        assert_eq!(round.feedback(Some(0)), Feedback::Incorrect);
        assert_eq!(round.feedback(None), Feedback::Unanswered);
        assert!(round.has_option(2));
        assert!(!round.has_option(3));
    }
}
