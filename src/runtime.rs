//! Driving a view from a `tokio` task
//!
//! Views never sleep. [`drive`] owns the waiting: it sleeps until the
//! view's next alarm or the next push, whichever comes first, and hands the
//! view the real time that passed before anything else happens to it.

use std::time::Duration;

use tokio::{sync::mpsc::UnboundedReceiver, time::Instant};
use tracing::debug;

use crate::{
    Push,
    channel::Channel,
    view::{HostView, Navigation, PlayerView, WinnersView},
};

/// A view that reacts to pushes and to the passing of time
pub trait Timed {
    /// Handles a server push, possibly asking to navigate away
    fn receive_push(&mut self, push: Push) -> Option<Navigation>;

    /// Lets `elapsed` time pass on the view's timers
    fn advance(&mut self, elapsed: Duration);

    /// Time until the view's next alarm, if any is pending
    fn until_next_alarm(&self) -> Option<Duration>;
}

impl<C: Channel> Timed for PlayerView<C> {
    fn receive_push(&mut self, push: Push) -> Option<Navigation> {
        PlayerView::receive_push(self, push)
    }

    fn advance(&mut self, elapsed: Duration) {
        PlayerView::advance(self, elapsed);
    }

    fn until_next_alarm(&self) -> Option<Duration> {
        self.machine().until_next_alarm()
    }
}

impl<C: Channel> Timed for HostView<C> {
    fn receive_push(&mut self, push: Push) -> Option<Navigation> {
        HostView::receive_push(self, push)
    }

    fn advance(&mut self, elapsed: Duration) {
        HostView::advance(self, elapsed);
    }

    fn until_next_alarm(&self) -> Option<Duration> {
        self.machine()?.until_next_alarm()
    }
}

impl<C: Channel> Timed for WinnersView<C> {
    fn receive_push(&mut self, push: Push) -> Option<Navigation> {
        WinnersView::receive_push(self, push)
    }

    fn advance(&mut self, _elapsed: Duration) {}

    fn until_next_alarm(&self) -> Option<Duration> {
        None
    }
}

async fn alarm(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

/// Runs `view` until it asks to navigate or the push stream ends
///
/// Returns the requested navigation, or `None` when the stream closed. The
/// view keeps whatever phase it reached; it only progresses again once it is
/// driven with a fresh stream.
pub async fn drive<V: Timed>(
    view: &mut V,
    pushes: &mut UnboundedReceiver<Push>,
) -> Option<Navigation> {
    let mut last = Instant::now();
    let mut catch_up = |view: &mut V| {
        let now = Instant::now();
        view.advance(now - last);
        last = now;
    };

    loop {
        tokio::select! {
            push = pushes.recv() => {
                catch_up(view);
                let Some(push) = push else {
                    debug!("push stream closed");
                    return None;
                };
                if let Some(navigation) = view.receive_push(push) {
                    debug!(%navigation, "view asked to navigate");
                    return Some(navigation);
                }
            }
            () = alarm(view.until_next_alarm()) => catch_up(view),
        }
    }
}
