//! Page-level controllers
//!
//! Each view corresponds to one page of the quiz client. A view opens its
//! channel when it mounts, owns it exclusively, and closes it (cancelling
//! every pending alarm first) when it is dropped. Views never navigate by
//! themselves; they return a [`Navigation`] for the embedding application
//! to follow.

use std::fmt::Display;

use serde::Serialize;

use crate::session_id::{QuizId, SessionId};

pub mod host;
pub mod join;
pub mod player;
pub mod winners;

pub use host::HostView;
pub use join::JoinView;
pub use player::PlayerView;
pub use winners::WinnersView;

/// A page the client should move to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Navigation {
    /// The join form, optionally prefilled with a session
    Join {
        /// Session to prefill
        session: Option<SessionId>,
    },
    /// The player's quiz page
    Quiz {
        /// Session being played
        session: SessionId,
    },
    /// The host's management page
    Manage {
        /// Quiz being run
        quiz: QuizId,
        /// Session being run, absent before the host started one
        session: Option<SessionId>,
        /// Short code players can type instead of the session id
        code: Option<SessionId>,
    },
    /// The leaderboard
    Winners {
        /// Session to rank
        session: SessionId,
    },
}

impl Navigation {
    /// Path of the page, relative to the application's origin
    pub fn path(&self) -> String {
        match self {
            Navigation::Join { session: None } => "/".to_owned(),
            Navigation::Join {
                session: Some(session),
            } => format!("/{session}"),
            Navigation::Quiz { session } => format!("/quiz/{session}"),
            Navigation::Manage {
                quiz,
                session: None,
                ..
            } => format!("/manage-quiz/{quiz}"),
            Navigation::Manage {
                quiz,
                session: Some(session),
                code: None,
            } => format!("/manage-quiz/{quiz}/{session}"),
            Navigation::Manage {
                quiz,
                session: Some(session),
                code: Some(code),
            } => format!("/manage-quiz/{quiz}/{session}?code={code}"),
            Navigation::Winners { session } => format!("/winners/{session}"),
        }
    }

    /// Parses a path produced by [`Navigation::path`]
    ///
    /// Returns `None` for paths that name no page or carry invalid ids.
    pub fn from_path(path: &str) -> Option<Self> {
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let code = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("code="))
            .and_then(|code| code.parse().ok());
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Navigation::Join { session: None }),
            ["quiz", session] => Some(Navigation::Quiz {
                session: session.parse().ok()?,
            }),
            ["winners", session] => Some(Navigation::Winners {
                session: session.parse().ok()?,
            }),
            ["manage-quiz", quiz] => Some(Navigation::Manage {
                quiz: quiz.parse().ok()?,
                session: None,
                code: None,
            }),
            ["manage-quiz", quiz, session] => Some(Navigation::Manage {
                quiz: quiz.parse().ok()?,
                session: Some(session.parse().ok()?),
                code,
            }),
            [session] if !["quiz", "winners", "manage-quiz"].contains(session) => {
                Some(Navigation::Join {
                    session: Some(session.parse().ok()?),
                })
            }
            _ => None,
        }
    }
}

impl Display for Navigation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of mounting a view
#[derive(Debug)]
pub enum Mount<V> {
    /// The view is live
    Ready(V),
    /// The view cannot be shown; go elsewhere instead
    Redirect(Navigation),
}

impl<V> Mount<V> {
    /// The live view, if mounting did not redirect
    pub fn ready(self) -> Option<V> {
        match self {
            Mount::Ready(view) => Some(view),
            Mount::Redirect(_) => None,
        }
    }

    /// The redirect, if mounting did not produce a view
    pub fn redirect(&self) -> Option<&Navigation> {
        match self {
            Mount::Ready(_) => None,
            Mount::Redirect(navigation) => Some(navigation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(s: &str) -> SessionId {
        s.parse().unwrap()
    }

    #[test]
    fn test_paths() {
        assert_eq!(Navigation::Join { session: None }.path(), "/");
        assert_eq!(
            Navigation::Join {
                session: Some(session("abc"))
            }
            .path(),
            "/abc"
        );
        assert_eq!(
            Navigation::Quiz {
                session: session("abc")
            }
            .path(),
            "/quiz/abc"
        );
        assert_eq!(
            Navigation::Manage {
                quiz: "q1".parse().unwrap(),
                session: Some(session("abc")),
                code: Some(session("1234")),
            }
            .to_string(),
            "/manage-quiz/q1/abc?code=1234"
        );
        assert_eq!(
            Navigation::Winners {
                session: session("abc")
            }
            .path(),
            "/winners/abc"
        );
    }

    #[test]
    fn test_paths_parse_back() {
        for navigation in [
            Navigation::Join { session: None },
            Navigation::Join {
                session: Some(session("abc")),
            },
            Navigation::Quiz {
                session: session("abc"),
            },
            Navigation::Manage {
                quiz: "q1".parse().unwrap(),
                session: None,
                code: None,
            },
            Navigation::Manage {
                quiz: "q1".parse().unwrap(),
                session: Some(session("abc")),
                code: Some(session("1234")),
            },
            Navigation::Winners {
                session: session("abc"),
            },
        ] {
            assert_eq!(Navigation::from_path(&navigation.path()), Some(navigation));
        }
    }

    #[test]
    fn test_unknown_paths() {
        assert_eq!(Navigation::from_path("/quiz"), None);
        assert_eq!(Navigation::from_path("/a/b/c/d"), None);
    }
}
