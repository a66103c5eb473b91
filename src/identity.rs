//! Persisted participant identity
//!
//! A participant who reloads the page mid-quiz should land back in the same
//! session without joining again. The identity store keeps the bound session
//! id and the participant id in a session-scoped key/value storage and throws
//! both away as soon as the route names a different session.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use crate::{
    constants::storage::{PARTICIPANT_KEY, SESSION_KEY},
    participant::ParticipantId,
    session_id::SessionId,
};

/// Errors raised by a storage backend
#[derive(Error, Debug)]
pub enum Error {
    /// Reading or writing the backing file failed
    #[error("identity storage i/o failed")]
    Io(#[from] std::io::Error),
    /// The backing file does not contain a string map
    #[error("identity storage is malformed")]
    Format(#[from] serde_json::Error),
}

/// Key/value storage that outlives a single page view
pub trait Storage {
    /// Reads the value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to persist the change.
    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;

    /// Removes every stored key
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to persist the change.
    fn clear(&mut self) -> Result<(), Error>;
}

/// In-memory storage, shared by views of a single process
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.entries.clear();
        Ok(())
    }
}

/// Storage persisted as a JSON object in a file
///
/// Every mutation rewrites the whole file; the map only ever holds a couple
/// of short strings.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens the storage at `path`, starting empty if the file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<(), Error> {
        fs::write(&self.path, serde_json::to_string(&self.entries)?)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.entries.insert(key.to_owned(), value.to_owned());
        self.flush()
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.entries.clear();
        self.flush()
    }
}

/// Result of binding the store to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// The session was already bound; the stored identity was kept
    Retained,
    /// A different (or no) session was bound; the stored identity was cleared
    Rebound,
}

/// What a view should do with the identity found for its route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resume {
    /// The stored participant belongs to the route's session and can rejoin
    Rejoin(ParticipantId),
    /// No usable identity exists for the route's session
    JoinRequired,
}

/// Participant identity bound to one session
#[derive(Debug, Default)]
pub struct IdentityStore<S> {
    storage: S,
}

impl<S: Storage> IdentityStore<S> {
    /// Wraps a storage backend
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Binds the store to `session`
    ///
    /// If a different session was bound before, the whole identity (session
    /// and participant) is cleared before the new session is recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn bind(&mut self, session: &SessionId) -> Result<Binding, Error> {
        if self.current_session().as_ref() == Some(session) {
            return Ok(Binding::Retained);
        }
        debug!(%session, "binding identity to new session");
        self.storage.clear()?;
        self.storage.set(SESSION_KEY, session.as_str())?;
        Ok(Binding::Rebound)
    }

    /// The currently bound session, if any
    pub fn current_session(&self) -> Option<SessionId> {
        self.storage.get(SESSION_KEY)?.parse().ok()
    }

    /// The participant id recorded for the bound session, if any
    pub fn current_participant(&self) -> Option<ParticipantId> {
        self.storage.get(PARTICIPANT_KEY)?.parse().ok()
    }

    /// Records the participant id handed out by a successful join
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn set_participant(&mut self, participant: &ParticipantId) -> Result<(), Error> {
        self.storage.set(PARTICIPANT_KEY, participant.as_str())
    }

    /// Records a successful join: binds `session` and stores `participant`
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn record_join(
        &mut self,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> Result<(), Error> {
        self.bind(session)?;
        self.set_participant(participant)
    }

    /// Checks the stored identity against the route's session
    ///
    /// A participant id stored for another session is stale: the identity is
    /// discarded, the route's session is bound, and a fresh join is required.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn resume(&mut self, route: &SessionId) -> Result<Resume, Error> {
        match (self.current_session(), self.current_participant()) {
            (Some(session), Some(participant)) if &session == route => {
                Ok(Resume::Rejoin(participant))
            }
            (session, participant) => {
                if participant.is_some() {
                    debug!(stored = ?session, %route, "discarding stale identity");
                }
                self.bind(route)?;
                Ok(Resume::JoinRequired)
            }
        }
    }

    /// Removes everything from the store
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.storage.clear()
    }

    /// The underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }
}
