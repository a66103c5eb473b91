//! Leaderboard page

use tracing::warn;

use crate::{
    Intent, Push,
    channel::Channel,
    constants::notice,
    leaderboard::{Leaderboard, RankedStanding},
    session_id::SessionId,
};

use super::Navigation;

/// Controller of the leaderboard page
#[derive(Debug)]
pub struct WinnersView<C: Channel> {
    channel: Option<C>,
    session: SessionId,
    leaderboard: Leaderboard,
}

impl<C: Channel> WinnersView<C> {
    /// Mounts the page and asks for the current ranking
    pub fn mount(session: SessionId, connect: impl FnOnce() -> C) -> Self {
        Self::with_leaderboard(session, Leaderboard::new(), connect)
    }

    /// Mounts the page with a given (for example seeded) leaderboard
    pub fn with_leaderboard(
        session: SessionId,
        leaderboard: Leaderboard,
        connect: impl FnOnce() -> C,
    ) -> Self {
        let channel = connect();
        channel.send_intent(&Intent::RetrieveWinners {
            session_id: session.clone(),
        });
        Self {
            channel: Some(channel),
            session,
            leaderboard,
        }
    }

    /// Handles a server push
    pub fn receive_push(&mut self, push: Push) -> Option<Navigation> {
        match push {
            Push::WinnersPushed(entries) => self.leaderboard.merge(entries),
            push => warn!(?push, "ignoring push on the leaderboard"),
        }
        None
    }

    /// The podium: the top three with their ranks
    pub fn podium(&self) -> Vec<RankedStanding<'_>> {
        self.leaderboard.podium().collect()
    }

    /// Every participant with their rank
    pub fn ranking(&self) -> Vec<RankedStanding<'_>> {
        self.leaderboard.ranked().collect()
    }

    /// Notice to show instead of the ranking, if nobody is ranked yet
    pub fn notice(&self) -> Option<&'static str> {
        self.leaderboard.is_empty().then_some(notice::NO_WINNERS)
    }

    /// The session being ranked
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// The merged leaderboard
    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }
}

impl<C: Channel> Drop for WinnersView<C> {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
    }
}
