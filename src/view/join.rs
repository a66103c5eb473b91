//! Join form
//!
//! Collects a session id (or share code) and a display name, sends the join
//! intent, and on acceptance records the identity and moves to the quiz.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Mount, Navigation};
use crate::{
    Intent, Push,
    channel::Channel,
    identity::{self, IdentityStore, Resume, Storage},
    participant::{NameError, validate_name},
    session_id::{self, SessionId},
};

/// Errors shown on the join form
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// One of the fields was left blank
    #[error("both session id/code and name are required")]
    MissingFields,
    /// The session field does not hold a usable id
    #[error("session id/code is invalid: {0}")]
    Session(#[from] session_id::Error),
    /// The name was refused
    #[error("name is invalid: {0}")]
    Name(#[from] NameError),
    /// The server declined the join
    #[error("{0}")]
    Rejected(String),
}

/// Controller of the join form
#[derive(Debug)]
pub struct JoinView<C: Channel> {
    channel: Option<C>,
    prefill: Option<SessionId>,
    pending: Option<SessionId>,
    error: Option<Error>,
}

impl<C: Channel> JoinView<C> {
    /// Mounts the form for `route`, the session named in the page path
    ///
    /// When the stored identity already belongs to the route's session the
    /// participant is sent straight back to the quiz. A stored identity for
    /// any other session is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity storage fails.
    pub fn mount<S: Storage>(
        route: Option<SessionId>,
        identity: &mut IdentityStore<S>,
        connect: impl FnOnce() -> C,
    ) -> Result<Mount<Self>, identity::Error> {
        if let Some(session) = &route {
            if let Resume::Rejoin(participant) = identity.resume(session)? {
                debug!(%session, %participant, "identity found, skipping join");
                return Ok(Mount::Redirect(Navigation::Quiz {
                    session: session.clone(),
                }));
            }
        }
        Ok(Mount::Ready(Self {
            channel: Some(connect()),
            prefill: route,
            pending: None,
            error: None,
        }))
    }

    /// Validates the form and sends the join intent
    ///
    /// # Errors
    ///
    /// Returns the validation error, which is also kept for display.
    pub fn submit(&mut self, session: &str, name: &str) -> Result<(), Error> {
        let result = Self::validate(session, name);
        match result {
            Ok((session, name)) => {
                self.error = None;
                if let Some(channel) = &self.channel {
                    channel.send_intent(&Intent::Join {
                        session_id: session.clone(),
                        participant_name: Some(name),
                    });
                }
                self.pending = Some(session);
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn validate(session: &str, name: &str) -> Result<(SessionId, String), Error> {
        if session.trim().is_empty() || name.trim().is_empty() {
            return Err(Error::MissingFields);
        }
        Ok((session.parse()?, validate_name(name)?))
    }

    /// Handles a push answering the join intent
    ///
    /// # Errors
    ///
    /// Returns an error if recording the new identity fails.
    pub fn receive_push<S: Storage>(
        &mut self,
        push: Push,
        identity: &mut IdentityStore<S>,
    ) -> Result<Option<Navigation>, identity::Error> {
        match push {
            Push::Joined(accepted) => {
                let Some(session) = accepted.session_id.or_else(|| self.pending.take()) else {
                    warn!("join accepted without a pending join");
                    return Ok(None);
                };
                identity.record_join(&session, &accepted.participant_id)?;
                debug!(%session, participant = %accepted.participant_id, "joined");
                Ok(Some(Navigation::Quiz { session }))
            }
            Push::JoinRejected { message } => {
                self.pending = None;
                self.error = Some(Error::Rejected(message));
                Ok(None)
            }
            push => {
                warn!(?push, "ignoring push on the join form");
                Ok(None)
            }
        }
    }

    /// Session to prefill the form with
    pub fn prefill(&self) -> Option<&SessionId> {
        self.prefill.as_ref()
    }

    /// The error to display, if any
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }
}

impl<C: Channel> Drop for JoinView<C> {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
    }
}
