//! Answer submission gate
//!
//! A player may tap an option as often as they like; only the first tap
//! during the answering phase of a round turns into a submission. The gate
//! remembers that submission until the next round resets it.

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::{participant::ParticipantId, phase::Phase};

/// An accepted answer: at most one per participant per round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    /// Who answered
    pub participant: ParticipantId,
    /// Which round the answer belongs to
    pub round: u64,
    /// Index of the chosen option
    pub option: usize,
}

/// Why a submission was not accepted
///
/// These are local preconditions, never shown to the user.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// Only players answer; the host never submits
    #[error("only players may submit answers")]
    NotAPlayer,
    /// Answers are only accepted while answering is open
    #[error("answers are not accepted in the {0:?} phase")]
    WrongPhase(Phase),
    /// This round already has a submission
    #[error("an answer was already submitted this round")]
    AlreadyAnswered,
    /// The option index does not exist in the round
    #[error("option {0} does not exist")]
    UnknownOption(usize),
}

/// Guards that one answer per round is accepted, and only while answering
#[derive(Debug, Clone, Default)]
pub struct SubmissionGate {
    accepted: Option<Submission>,
}

impl SubmissionGate {
    /// Tries to accept `option` for `participant` in `round`
    ///
    /// # Errors
    ///
    /// Returns why the submission was rejected. A rejection leaves the gate
    /// unchanged.
    pub fn submit(
        &mut self,
        phase: Phase,
        round: u64,
        participant: &ParticipantId,
        option: usize,
    ) -> Result<Submission, Rejected> {
        if phase != Phase::Answering {
            trace!(?phase, option, "submission outside answering");
            return Err(Rejected::WrongPhase(phase));
        }
        if self.accepted.as_ref().is_some_and(|s| s.round == round) {
            trace!(round, option, "duplicate submission");
            return Err(Rejected::AlreadyAnswered);
        }
        let submission = Submission {
            participant: participant.clone(),
            round,
            option,
        };
        self.accepted = Some(submission.clone());
        Ok(submission)
    }

    /// Whether an answer was accepted this round
    pub fn has_answered(&self) -> bool {
        self.accepted.is_some()
    }

    /// The accepted submission, if any
    pub fn submission(&self) -> Option<&Submission> {
        self.accepted.as_ref()
    }

    /// The option chosen this round, if any
    pub fn selected_option(&self) -> Option<usize> {
        self.accepted.as_ref().map(|s| s.option)
    }

    /// Forgets the previous round's submission
    pub fn reset(&mut self) {
        self.accepted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant() -> ParticipantId {
        "p1".parse().unwrap()
    }

    #[test]
    fn test_submit_while_answering() {
        let mut gate = SubmissionGate::default();
        let submission = gate.submit(Phase::Answering, 1, &participant(), 2).unwrap();

        assert_eq!(submission.option, 2);
        assert_eq!(submission.round, 1);
        assert!(gate.has_answered());
        assert_eq!(gate.selected_option(), Some(2));
    }

    #[test]
    fn test_submit_outside_answering() {
        let mut gate = SubmissionGate::default();
        for phase in [
            Phase::Idle,
            Phase::Displaying,
            Phase::Grace,
            Phase::Revealed,
            Phase::Ended,
        ] {
            assert_eq!(
                gate.submit(phase, 1, &participant(), 0),
                Err(Rejected::WrongPhase(phase))
            );
        }
        assert!(!gate.has_answered());
    }

    #[test]
    fn test_rapid_repeated_submissions() {
        let mut gate = SubmissionGate::default();
        let accepted = (0..10)
            .filter(|i| gate.submit(Phase::Answering, 1, &participant(), i % 3).is_ok())
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(gate.selected_option(), Some(0));
        assert_eq!(
            gate.submit(Phase::Answering, 1, &participant(), 1),
            Err(Rejected::AlreadyAnswered)
        );
    }

    #[test]
    fn test_reset_allows_next_round() {
        let mut gate = SubmissionGate::default();
        gate.submit(Phase::Answering, 1, &participant(), 0).unwrap();
        gate.reset();

        assert!(!gate.has_answered());
        assert!(gate.submit(Phase::Answering, 2, &participant(), 1).is_ok());
    }
}
