//! Host management page
//!
//! Before a session exists the page only offers to start one. Once the
//! route names a session, the host follows it with its own phase state
//! machine, advances questions, and asks for the reveal when its grace
//! timer runs out.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::Navigation;
use crate::{
    Intent, Push,
    channel::Channel,
    config::ClientConfig,
    constants::notice,
    participant::Role,
    phase::{Phase, QuizMachine},
    session_id::{QuizId, SessionId, SessionStatus},
};

/// Controller of the host's management page
#[derive(Debug)]
pub struct HostView<C: Channel> {
    channel: Option<C>,
    quiz: QuizId,
    code: Option<SessionId>,
    machine: Option<QuizMachine>,
    invalid: bool,
}

impl<C: Channel> HostView<C> {
    /// Mounts the page for `quiz`, following `session` if the route names one
    pub fn mount(
        quiz: QuizId,
        session: Option<SessionId>,
        code: Option<SessionId>,
        config: ClientConfig,
        connect: impl FnOnce() -> C,
    ) -> Self {
        let channel = connect();
        let machine = session.map(|session| {
            channel.send_intent(&Intent::HostJoin {
                session_id: session.clone(),
            });
            let mut machine = QuizMachine::new(Role::Host, session, config);
            machine.mark_created();
            machine
        });
        Self {
            channel: Some(channel),
            quiz,
            code,
            machine,
            invalid: false,
        }
    }

    /// Asks the server to start a new session of the quiz
    pub fn start(&self) {
        debug!(quiz = %self.quiz, "starting session");
        self.send(&Intent::StartSession {
            quiz_id: self.quiz.clone(),
        });
    }

    /// Asks the server to push the next question
    ///
    /// Returns whether the intent was sent; see [`HostView::can_advance`].
    pub fn next(&self) -> bool {
        let Some(machine) = self.machine.as_ref().filter(|_| self.can_advance()) else {
            return false;
        };
        self.send(&Intent::AdvanceQuestion {
            session_id: machine.session().clone(),
        });
        true
    }

    /// Whether the next question may be requested
    ///
    /// Disabled without a valid session, while waiting for the reveal, and
    /// once the quiz ended.
    pub fn can_advance(&self) -> bool {
        !self.invalid
            && self
                .machine
                .as_ref()
                .is_some_and(|m| !matches!(m.phase(), Phase::Grace | Phase::Ended))
    }

    /// Handles a server push
    pub fn receive_push(&mut self, push: Push) -> Option<Navigation> {
        match push {
            Push::SessionStarted(started) => {
                info!(quiz = %self.quiz, session = %started.session_id, "session started");
                return Some(Navigation::Manage {
                    quiz: self.quiz.clone(),
                    session: Some(started.session_id),
                    code: started.code,
                });
            }
            Push::InvalidSession => {
                warn!(quiz = %self.quiz, "server does not know this quiz");
                self.invalid = true;
            }
            Push::RoundPushed(round) => match &mut self.machine {
                Some(machine) => machine.receive_round(round),
                None => warn!("round pushed before a session was started"),
            },
            Push::AnswerRevealed => {
                if let Some(machine) = &mut self.machine {
                    machine.receive_reveal();
                }
            }
            Push::QuizEnded => {
                if let Some(machine) = &mut self.machine {
                    machine.receive_quiz_ended();
                }
            }
            push => warn!(?push, "ignoring push on the management page"),
        }
        None
    }

    /// Lets `elapsed` time pass on the page's timers
    pub fn advance(&mut self, elapsed: Duration) {
        let channel = self.channel.as_ref();
        if let Some(machine) = &mut self.machine {
            machine.advance(elapsed, |intent| {
                if let Some(channel) = channel {
                    channel.send_intent(&intent);
                }
            });
        }
    }

    fn send(&self, intent: &Intent) {
        if let Some(channel) = &self.channel {
            channel.send_intent(intent);
        }
    }

    /// Link players open to join, built from the share code when there is one
    pub fn share_url(&self, origin: &str) -> Option<String> {
        let target = self
            .code
            .as_ref()
            .or_else(|| self.machine.as_ref().map(QuizMachine::session))?;
        Some(format!("{}/{target}", origin.trim_end_matches('/')))
    }

    /// Inline notice to show, if any
    pub fn notice(&self) -> Option<&'static str> {
        if self.invalid {
            return Some(notice::INVALID_SESSION);
        }
        match self.machine.as_ref()?.phase() {
            Phase::Grace => Some(notice::WAITING_FOR_REVEAL),
            Phase::Ended => Some(notice::QUIZ_ENDED),
            _ => None,
        }
    }

    /// Navigation back to this quiz's page to run it again, once it ended
    pub fn start_another(&self) -> Option<Navigation> {
        (self.status() == SessionStatus::Ended).then(|| Navigation::Manage {
            quiz: self.quiz.clone(),
            session: None,
            code: None,
        })
    }

    /// Navigation to the session's leaderboard
    pub fn leaderboard(&self) -> Option<Navigation> {
        self.machine.as_ref().map(|machine| Navigation::Winners {
            session: machine.session().clone(),
        })
    }

    /// Lifecycle of the followed session
    pub fn status(&self) -> SessionStatus {
        self.machine
            .as_ref()
            .map_or(SessionStatus::Unknown, QuizMachine::status)
    }

    /// The page's phase state machine, once a session is followed
    pub fn machine(&self) -> Option<&QuizMachine> {
        self.machine.as_ref()
    }

    /// The quiz this page runs
    pub fn quiz(&self) -> &QuizId {
        &self.quiz
    }
}

impl<C: Channel> Drop for HostView<C> {
    fn drop(&mut self) {
        if let Some(machine) = &mut self.machine {
            machine.shutdown();
        }
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
    }
}
