//! Quiz phase state machine
//!
//! Every client, host and player alike, runs one [`QuizMachine`]. A single
//! round push puts it into [`Phase::Displaying`]; from there it walks through
//! answering and grace on its own timers. The reveal is different: the
//! host's grace alarm only emits the reveal intent, and every client enters
//! [`Phase::Revealed`] when the server broadcasts it back, so all clients
//! reveal on the same push instead of on their own skewed clocks.
//!
//! ```text
//! Idle --[round]--> Displaying --[question]--> Answering --[answering]--> Grace
//! Grace --[grace elapsed: host emits reveal intent]--> Grace
//! Displaying | Answering | Grace --[answer revealed]--> Revealed
//! Revealed --[round]--> Displaying
//! any --[quiz ended]--> Ended
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    Intent,
    config::ClientConfig,
    participant::{ParticipantId, Role},
    round::{Feedback, Round, RoundPush, Timing},
    session_id::{SessionId, SessionStatus},
    submission::{Rejected, Submission, SubmissionGate},
    timer::{Countdown, PhaseTimer, TimerHandle},
};

/// The visible stage of the quiz on one client
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No round has been pushed yet
    #[default]
    Idle,
    /// The question is shown, options are not yet selectable
    Displaying,
    /// Options are shown and answers are accepted
    Answering,
    /// Answering closed, waiting for the reveal broadcast
    Grace,
    /// The correct option is shown
    Revealed,
    /// The quiz is over
    Ended,
}

/// Alarms the machine schedules for itself
///
/// Each alarm carries the round it was scheduled in; an alarm from an older
/// round is dropped even if it somehow survived cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alarm {
    /// Move from one timed phase into the next
    Proceed {
        /// Round the alarm belongs to
        round: u64,
        /// Phase to enter
        to: Phase,
    },
    /// The grace period ended; the host asks for the reveal
    GraceElapsed {
        /// Round the alarm belongs to
        round: u64,
    },
    /// One countdown display tick
    Tick {
        /// Round the alarm belongs to
        round: u64,
    },
}

impl Alarm {
    fn round(self) -> u64 {
        match self {
            Alarm::Proceed { round, .. }
            | Alarm::GraceElapsed { round }
            | Alarm::Tick { round } => round,
        }
    }
}

/// How one option should be drawn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionMark<'a> {
    /// Option text
    pub text: &'a str,
    /// This client submitted this option
    pub selected: bool,
    /// Revealed as the correct option
    pub correct: bool,
    /// Revealed, submitted by this client, and wrong
    pub incorrect: bool,
}

/// One client's replay of the quiz timeline
#[derive(Debug)]
pub struct QuizMachine {
    role: Role,
    session: SessionId,
    config: ClientConfig,
    phase: Phase,
    status: SessionStatus,
    round_index: u64,
    round: Option<Round>,
    gate: SubmissionGate,
    timer: PhaseTimer<Alarm>,
    phase_alarm: Option<TimerHandle>,
    tick_alarm: Option<TimerHandle>,
    countdown: Countdown,
}

impl QuizMachine {
    /// Creates an idle machine for `role` in `session`
    pub fn new(role: Role, session: SessionId, config: ClientConfig) -> Self {
        Self {
            role,
            session,
            config,
            phase: Phase::Idle,
            status: SessionStatus::default(),
            round_index: 0,
            round: None,
            gate: SubmissionGate::default(),
            timer: PhaseTimer::new(),
            phase_alarm: None,
            tick_alarm: None,
            countdown: Countdown::default(),
        }
    }

    /// Handles a round push
    ///
    /// Whatever the current phase, pending alarms of the previous round are
    /// cancelled and the machine restarts in `Displaying` for the new round.
    /// Pushes after the quiz ended, and pushes that fail validation, are
    /// ignored.
    pub fn receive_round(&mut self, push: RoundPush) {
        if self.phase == Phase::Ended {
            warn!(session = %self.session, "round pushed after the quiz ended");
            return;
        }
        let round = match Round::from_push(push, self.config.grace) {
            Ok(round) => round,
            Err(e) => {
                warn!(session = %self.session, error = %e, "ignoring invalid round");
                return;
            }
        };

        self.cancel_alarms();
        self.round_index += 1;
        self.gate.reset();
        let timing = round.timing();
        self.round = Some(round);
        self.status.advance(SessionStatus::Active);
        self.set_phase(Phase::Displaying);

        if timing.question.is_zero() {
            self.enter_answering();
        } else {
            self.schedule_phase_end(
                timing.question,
                Alarm::Proceed {
                    round: self.round_index,
                    to: Phase::Answering,
                },
            );
        }
    }

    /// Handles the reveal broadcast
    ///
    /// Accepted while a round is in progress; ignored before the first
    /// round, after a reveal, and after the quiz ended.
    pub fn receive_reveal(&mut self) {
        match self.phase {
            Phase::Displaying | Phase::Answering | Phase::Grace => {
                self.cancel_alarms();
                self.set_phase(Phase::Revealed);
            }
            Phase::Idle | Phase::Revealed | Phase::Ended => {
                debug!(phase = ?self.phase, "ignoring reveal");
            }
        }
    }

    /// Handles the end-of-quiz push; the machine stays ended from then on
    pub fn receive_quiz_ended(&mut self) {
        if self.phase == Phase::Ended {
            return;
        }
        self.cancel_alarms();
        self.status.advance(SessionStatus::Ended);
        self.set_phase(Phase::Ended);
    }

    /// Marks the session as created (host start acknowledged)
    pub fn mark_created(&mut self) {
        self.status.advance(SessionStatus::Created);
    }

    /// Handles an alarm that came due
    pub fn receive_alarm<E: FnMut(Intent)>(&mut self, alarm: Alarm, mut emit: E) {
        if alarm.round() != self.round_index {
            trace!(?alarm, current = self.round_index, "dropping stale alarm");
            return;
        }
        match alarm {
            Alarm::Proceed {
                to: Phase::Answering,
                ..
            } => self.enter_answering(),
            Alarm::Proceed {
                to: Phase::Grace, ..
            } => self.enter_grace(),
            Alarm::Proceed { to, .. } => {
                warn!(?to, "no timed transition into phase");
            }
            Alarm::GraceElapsed { round } => {
                self.countdown.clear();
                if self.phase == Phase::Grace && self.role.reveals() {
                    debug!(round, session = %self.session, "requesting reveal");
                    emit(Intent::RevealAnswer {
                        session_id: self.session.clone(),
                    });
                }
            }
            Alarm::Tick { round } => {
                if self.countdown.tick(self.config.countdown_tick) {
                    self.tick_alarm = Some(
                        self.timer
                            .schedule(self.config.countdown_tick, Alarm::Tick { round }),
                    );
                } else {
                    self.tick_alarm = None;
                }
            }
        }
    }

    /// Lets `elapsed` time pass, handling every alarm that comes due
    ///
    /// Alarms scheduled while handling an earlier one are measured from the
    /// moment it fired, so a single large step replays the same timeline as
    /// many small ones.
    pub fn advance<E: FnMut(Intent)>(&mut self, elapsed: Duration, mut emit: E) {
        let until = self.timer.now() + elapsed;
        while let Some(alarm) = self.timer.pop_due(until) {
            self.receive_alarm(alarm, &mut emit);
        }
        self.timer.settle(until);
    }

    /// Tries to submit `option` on behalf of `participant`
    ///
    /// # Errors
    ///
    /// Returns why the answer was not accepted. Nothing is emitted then.
    pub fn submit(
        &mut self,
        participant: &ParticipantId,
        option: usize,
    ) -> Result<Submission, Rejected> {
        if !self.role.answers() {
            return Err(Rejected::NotAPlayer);
        }
        if let Some(round) = &self.round {
            if self.phase == Phase::Answering && !round.has_option(option) {
                return Err(Rejected::UnknownOption(option));
            }
        }
        self.gate
            .submit(self.phase, self.round_index, participant, option)
    }

    /// Cancels all pending alarms; used when the owning view goes away
    pub fn shutdown(&mut self) {
        self.cancel_alarms();
    }

    fn enter_answering(&mut self) {
        if !self.change_phase(Phase::Displaying, Phase::Answering) {
            return;
        }
        let answering = self.timing_of(|t| t.answering);
        self.schedule_phase_end(
            answering,
            Alarm::Proceed {
                round: self.round_index,
                to: Phase::Grace,
            },
        );
    }

    fn enter_grace(&mut self) {
        if !self.change_phase(Phase::Answering, Phase::Grace) {
            return;
        }
        let grace = self.timing_of(|t| t.grace);
        self.schedule_phase_end(
            grace,
            Alarm::GraceElapsed {
                round: self.round_index,
            },
        );
    }

    fn timing_of(&self, f: impl Fn(Timing) -> Duration) -> Duration {
        self.round
            .as_ref()
            .map_or(Duration::ZERO, |round| f(round.timing()))
    }

    /// Schedules the alarm ending the current phase and restarts the countdown
    fn schedule_phase_end(&mut self, delay: Duration, alarm: Alarm) {
        self.phase_alarm = Some(self.timer.schedule(delay, alarm));

        if let Some(tick) = self.tick_alarm.take() {
            self.timer.cancel(tick);
        }
        self.countdown.arm(delay);
        if self.countdown.remaining() > 0 {
            self.tick_alarm = Some(self.timer.schedule(
                self.config.countdown_tick,
                Alarm::Tick {
                    round: self.round_index,
                },
            ));
        }
    }

    fn cancel_alarms(&mut self) {
        self.timer.cancel_all();
        self.phase_alarm = None;
        self.tick_alarm = None;
        self.countdown.clear();
    }

    fn change_phase(&mut self, before: Phase, after: Phase) -> bool {
        if self.phase == before {
            self.set_phase(after);
            true
        } else {
            false
        }
    }

    fn set_phase(&mut self, to: Phase) {
        debug!(
            round = self.round_index,
            from = ?self.phase,
            ?to,
            role = ?self.role,
            "phase transition"
        );
        self.phase = to;
    }

    /// The current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The role this machine plays
    pub fn role(&self) -> Role {
        self.role
    }

    /// The session this machine follows
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Lifecycle of the session as seen by this client
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Number of rounds received so far; also the current round's index
    pub fn round_index(&self) -> u64 {
        self.round_index
    }

    /// The current round, if one was pushed
    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    /// Whether the current round was revealed
    pub fn is_revealed(&self) -> bool {
        self.phase == Phase::Revealed
    }

    /// The accepted submission of the current round
    pub fn submission(&self) -> Option<&Submission> {
        self.gate.submission()
    }

    /// Whether this client answered the current round
    pub fn has_answered(&self) -> bool {
        self.gate.has_answered()
    }

    /// The correct option, only once revealed
    pub fn revealed_correct_option(&self) -> Option<usize> {
        match (&self.round, self.phase) {
            (Some(round), Phase::Revealed) => Some(round.correct_option()),
            _ => None,
        }
    }

    /// Correctness of this client's answer, only once revealed
    pub fn feedback(&self) -> Option<Feedback> {
        match (&self.round, self.phase) {
            (Some(round), Phase::Revealed) => Some(round.feedback(self.gate.selected_option())),
            _ => None,
        }
    }

    /// The question shown in the current phase
    pub fn question(&self) -> Option<&str> {
        match self.phase {
            Phase::Displaying | Phase::Answering | Phase::Grace | Phase::Revealed => {
                self.round.as_ref().map(Round::question)
            }
            Phase::Idle | Phase::Ended => None,
        }
    }

    /// Whether answer options are on screen
    pub fn options_visible(&self) -> bool {
        matches!(self.phase, Phase::Answering | Phase::Revealed)
    }

    /// Options to draw with their selection and reveal marks
    pub fn options(&self) -> Vec<OptionMark<'_>> {
        let Some(round) = self.round.as_ref().filter(|_| self.options_visible()) else {
            return Vec::new();
        };
        let selected = self.gate.selected_option();
        let correct = self.revealed_correct_option();
        round
            .options()
            .iter()
            .enumerate()
            .map(|(i, text)| OptionMark {
                text,
                selected: selected == Some(i),
                correct: correct == Some(i),
                incorrect: correct.is_some() && selected == Some(i) && correct != Some(i),
            })
            .collect()
    }

    /// Whole seconds left in the current timed phase, for display
    pub fn time_left(&self) -> u64 {
        self.countdown.remaining()
    }

    /// Exact time left in the current timed phase
    pub fn until_phase_end(&self) -> Option<Duration> {
        self.phase_alarm
            .filter(|handle| self.timer.is_pending(*handle))
            .map(|handle| handle.deadline().saturating_sub(self.timer.now()))
    }

    /// Time until the next alarm, if any is pending
    pub fn until_next_alarm(&self) -> Option<Duration> {
        self.timer.until_next()
    }

    /// Number of pending alarms
    pub fn pending_alarms(&self) -> usize {
        self.timer.pending_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::tests::create_test_push;

    fn machine(role: Role) -> QuizMachine {
        QuizMachine::new(role, "s1".parse().unwrap(), ClientConfig::default())
    }

    fn participant() -> ParticipantId {
        "p1".parse().unwrap()
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_starts_idle() {
        let machine = machine(Role::Player);
        assert_eq!(machine.phase(), Phase::Idle);
        assert_eq!(machine.question(), None);
        assert_eq!(machine.until_next_alarm(), None);
    }

    #[test]
    fn test_round_walks_through_phases() {
        let mut machine = machine(Role::Player);
        let mut emitted = Vec::new();
        machine.receive_round(create_test_push());

        assert_eq!(machine.phase(), Phase::Displaying);
        assert_eq!(machine.question(), Some("Which planet is largest?"));
        assert!(!machine.options_visible());
        assert_eq!(machine.time_left(), 3);

        machine.advance(secs(2), |i| emitted.push(i));
        assert_eq!(machine.phase(), Phase::Displaying);
        assert_eq!(machine.time_left(), 1);
        assert_eq!(machine.until_phase_end(), Some(secs(1)));

        machine.advance(secs(1), |i| emitted.push(i));
        assert_eq!(machine.phase(), Phase::Answering);
        assert!(machine.options_visible());
        assert_eq!(machine.time_left(), 5);

        machine.advance(secs(5), |i| emitted.push(i));
        assert_eq!(machine.phase(), Phase::Grace);
        assert!(!machine.options_visible());
        assert_eq!(machine.time_left(), 5);

        machine.advance(secs(5), |i| emitted.push(i));
        assert_eq!(machine.phase(), Phase::Grace);
        assert_eq!(machine.time_left(), 0);
        assert_eq!(machine.until_phase_end(), None);
        assert!(emitted.is_empty());
    }

    #[test]
    fn test_player_grace_timer_does_not_reveal() {
        let mut machine = machine(Role::Player);
        let mut emitted = Vec::new();
        machine.receive_round(create_test_push());
        machine.advance(secs(60), |i| emitted.push(i));

        assert_eq!(machine.phase(), Phase::Grace);
        assert_eq!(machine.revealed_correct_option(), None);
        assert!(emitted.is_empty());
        assert_eq!(machine.pending_alarms(), 0);
    }

    #[test]
    fn test_host_grace_timer_emits_reveal_intent_only() {
        let mut machine = machine(Role::Host);
        let mut emitted = Vec::new();
        machine.receive_round(create_test_push());
        machine.advance(secs(12), |i| emitted.push(i));
        assert!(emitted.is_empty());

        machine.advance(secs(1), |i| emitted.push(i));
        assert_eq!(
            emitted,
            vec![Intent::RevealAnswer {
                session_id: "s1".parse().unwrap()
            }]
        );
        assert_eq!(machine.phase(), Phase::Grace);

        machine.receive_reveal();
        assert_eq!(machine.phase(), Phase::Revealed);
        assert_eq!(machine.revealed_correct_option(), Some(1));
    }

    #[test]
    fn test_new_round_resets_transient_state() {
        let mut machine = machine(Role::Player);
        machine.receive_round(create_test_push());
        machine.advance(secs(3), |_| {});
        machine.submit(&participant(), 0).unwrap();
        machine.advance(secs(10), |_| {});
        machine.receive_reveal();
        assert_eq!(machine.feedback(), Some(Feedback::Incorrect));

        machine.receive_round(create_test_push());
        assert_eq!(machine.phase(), Phase::Displaying);
        assert_eq!(machine.round_index(), 2);
        assert!(!machine.has_answered());
        assert!(!machine.is_revealed());
        assert_eq!(machine.feedback(), None);
    }

    #[test]
    fn test_new_round_cancels_stale_timers() {
        let mut machine = machine(Role::Host);
        let mut emitted = Vec::new();
        machine.receive_round(create_test_push());
        machine.advance(secs(7), |i| emitted.push(i));
        assert_eq!(machine.phase(), Phase::Answering);

        let mut push = create_test_push();
        push.time.question_duration = secs(20);
        machine.receive_round(push);

        // The old round would have entered grace at 8s and asked for the reveal at 13s.
        machine.advance(secs(19), |i| emitted.push(i));
        assert_eq!(machine.phase(), Phase::Displaying);
        assert!(emitted.is_empty());

        machine.advance(secs(1), |i| emitted.push(i));
        assert_eq!(machine.phase(), Phase::Answering);
    }

    #[test]
    fn test_stale_alarm_is_dropped() {
        let mut machine = machine(Role::Host);
        let mut emitted = Vec::new();
        machine.receive_round(create_test_push());
        machine.receive_round(create_test_push());

        machine.receive_alarm(
            Alarm::Proceed {
                round: 1,
                to: Phase::Answering,
            },
            |i| emitted.push(i),
        );
        machine.receive_alarm(Alarm::GraceElapsed { round: 1 }, |i| emitted.push(i));

        assert_eq!(machine.phase(), Phase::Displaying);
        assert!(emitted.is_empty());
    }

    #[test]
    fn test_host_cannot_submit() {
        let mut machine = machine(Role::Host);
        machine.receive_round(create_test_push());
        machine.advance(secs(3), |_| {});
        assert_eq!(machine.phase(), Phase::Answering);

        assert_eq!(
            machine.submit(&participant(), 0),
            Err(Rejected::NotAPlayer)
        );
        assert!(!machine.has_answered());
        assert_eq!(machine.submission(), None);
    }

    #[test]
    fn test_submit_only_while_answering() {
        let mut machine = machine(Role::Player);
        machine.receive_round(create_test_push());
        assert_eq!(
            machine.submit(&participant(), 1),
            Err(Rejected::WrongPhase(Phase::Displaying))
        );

        machine.advance(secs(3), |_| {});
        assert_eq!(
            machine.submit(&participant(), 7),
            Err(Rejected::UnknownOption(7))
        );
        assert!(machine.submit(&participant(), 1).is_ok());
        assert_eq!(
            machine.submit(&participant(), 2),
            Err(Rejected::AlreadyAnswered)
        );

        machine.advance(secs(5), |_| {});
        assert_eq!(machine.phase(), Phase::Grace);
        assert_eq!(machine.submission().map(|s| s.option), Some(1));
    }

    #[test]
    fn test_zero_question_duration_opens_answering() {
        let mut machine = machine(Role::Player);
        let mut push = create_test_push();
        push.time.question_duration = Duration::ZERO;
        machine.receive_round(push);

        assert_eq!(machine.phase(), Phase::Answering);
        assert_eq!(machine.time_left(), 5);
    }

    #[test]
    fn test_invalid_round_is_ignored() {
        let mut machine = machine(Role::Player);
        machine.receive_round(create_test_push());
        machine.advance(secs(3), |_| {});

        let mut push = create_test_push();
        push.correct_answer = 9;
        machine.receive_round(push);

        assert_eq!(machine.phase(), Phase::Answering);
        assert_eq!(machine.round_index(), 1);
    }

    #[test]
    fn test_reveal_ignored_when_idle() {
        let mut machine = machine(Role::Player);
        machine.receive_reveal();
        assert_eq!(machine.phase(), Phase::Idle);
    }

    #[test]
    fn test_early_reveal_cancels_round_timers() {
        let mut machine = machine(Role::Host);
        let mut emitted = Vec::new();
        machine.receive_round(create_test_push());
        machine.advance(secs(4), |i| emitted.push(i));
        machine.receive_reveal();

        assert_eq!(machine.phase(), Phase::Revealed);
        assert_eq!(machine.pending_alarms(), 0);
        machine.advance(secs(30), |i| emitted.push(i));
        assert_eq!(machine.phase(), Phase::Revealed);
        assert!(emitted.is_empty());
    }

    #[test]
    fn test_quiz_ended_is_terminal() {
        for steps in [0, 2, 4, 9] {
            let mut machine = machine(Role::Host);
            machine.receive_round(create_test_push());
            machine.advance(secs(steps), |_| {});
            machine.receive_quiz_ended();

            assert_eq!(machine.phase(), Phase::Ended);
            assert_eq!(machine.status(), SessionStatus::Ended);
            assert_eq!(machine.pending_alarms(), 0);

            machine.receive_round(create_test_push());
            machine.receive_reveal();
            assert_eq!(machine.phase(), Phase::Ended);
            assert_eq!(machine.question(), None);
        }
    }

    #[test]
    fn test_quiz_ended_from_idle() {
        let mut machine = machine(Role::Player);
        machine.receive_quiz_ended();
        assert_eq!(machine.phase(), Phase::Ended);
    }

    #[test]
    fn test_option_marks_after_reveal() {
        let mut machine = machine(Role::Player);
        machine.receive_round(create_test_push());
        machine.advance(secs(3), |_| {});
        machine.submit(&participant(), 2).unwrap();

        let marks = machine.options();
        assert!(marks[2].selected);
        assert!(marks.iter().all(|m| !m.correct && !m.incorrect));

        machine.advance(secs(5), |_| {});
        assert!(machine.options().is_empty());

        machine.receive_reveal();
        let marks = machine.options();
        assert_eq!(marks.len(), 3);
        assert!(marks[1].correct);
        assert!(marks[2].selected && marks[2].incorrect);
        assert!(!marks[0].selected && !marks[0].incorrect);
    }

    #[test]
    fn test_one_large_step_matches_small_steps() {
        let mut stepped = machine(Role::Host);
        let mut jumped = machine(Role::Host);
        let mut stepped_out = Vec::new();
        let mut jumped_out = Vec::new();
        stepped.receive_round(create_test_push());
        jumped.receive_round(create_test_push());

        for _ in 0..13 {
            stepped.advance(secs(1), |i| stepped_out.push(i));
        }
        jumped.advance(secs(13), |i| jumped_out.push(i));

        assert_eq!(stepped.phase(), jumped.phase());
        assert_eq!(stepped_out, jumped_out);
        assert_eq!(jumped_out.len(), 1);
    }
}
