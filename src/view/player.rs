//! Player quiz page

use std::time::Duration;

use tracing::{trace, warn};

use super::{Mount, Navigation};
use crate::{
    Intent, Push,
    channel::Channel,
    config::ClientConfig,
    identity::{self, IdentityStore, Resume, Storage},
    participant::{ParticipantId, Role},
    phase::QuizMachine,
    session_id::SessionId,
    submission::Rejected,
};

/// Controller of a player's quiz page
///
/// Mounting re-attaches the stored participant to the route's session;
/// without a matching identity the player is sent to the join form instead.
#[derive(Debug)]
pub struct PlayerView<C: Channel> {
    channel: Option<C>,
    participant: ParticipantId,
    machine: QuizMachine,
}

impl<C: Channel> PlayerView<C> {
    /// Mounts the quiz page for the session named in the route
    ///
    /// # Errors
    ///
    /// Returns an error if the identity storage fails.
    pub fn mount<S: Storage>(
        route: SessionId,
        identity: &mut IdentityStore<S>,
        config: ClientConfig,
        connect: impl FnOnce() -> C,
    ) -> Result<Mount<Self>, identity::Error> {
        let participant = match identity.resume(&route)? {
            Resume::Rejoin(participant) => participant,
            Resume::JoinRequired => {
                return Ok(Mount::Redirect(Navigation::Join {
                    session: Some(route),
                }));
            }
        };

        let channel = connect();
        channel.send_intent(&Intent::Join {
            session_id: route.clone(),
            participant_name: None,
        });
        Ok(Mount::Ready(Self {
            channel: Some(channel),
            participant,
            machine: QuizMachine::new(Role::Player, route, config),
        }))
    }

    /// Answers the current round with `option`
    ///
    /// # Errors
    ///
    /// Returns why the answer was not taken. Nothing is sent then, and the
    /// page shows nothing either.
    pub fn select(&mut self, option: usize) -> Result<(), Rejected> {
        let submission = self.machine.submit(&self.participant, option)?;
        self.send(&Intent::SubmitAnswer {
            session_id: self.machine.session().clone(),
            participant_id: submission.participant,
            option_index: submission.option,
        });
        Ok(())
    }

    /// Handles a server push
    pub fn receive_push(&mut self, push: Push) -> Option<Navigation> {
        match push {
            Push::RoundPushed(round) => self.machine.receive_round(round),
            Push::AnswerRevealed => self.machine.receive_reveal(),
            Push::QuizEnded => self.machine.receive_quiz_ended(),
            Push::Joined(_) => trace!("rejoined"),
            push => warn!(?push, "ignoring push on the quiz page"),
        }
        None
    }

    /// Lets `elapsed` time pass on the page's timers
    pub fn advance(&mut self, elapsed: Duration) {
        let channel = self.channel.as_ref();
        self.machine.advance(elapsed, |intent| {
            if let Some(channel) = channel {
                channel.send_intent(&intent);
            }
        });
    }

    fn send(&self, intent: &Intent) {
        if let Some(channel) = &self.channel {
            channel.send_intent(intent);
        }
    }

    /// The page's phase state machine
    pub fn machine(&self) -> &QuizMachine {
        &self.machine
    }

    /// The participant playing on this page
    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }
}

impl<C: Channel> Drop for PlayerView<C> {
    fn drop(&mut self) {
        self.machine.shutdown();
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
    }
}
