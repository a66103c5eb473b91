//! Configuration constants for the quiz client
//!
//! This module contains the limits and fixed values used throughout the
//! client to validate pushed rounds, bound configuration, and keep the
//! persisted identity layout stable.

/// Round configuration constants
pub mod round {
    /// Maximum length of a question text in characters
    pub const MAX_QUESTION_LENGTH: usize = 500;
    /// Minimum number of answer options in a round
    pub const MIN_OPTION_COUNT: usize = 1;
    /// Maximum number of answer options in a round
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Maximum length of a single answer option in characters
    pub const MAX_OPTION_LENGTH: usize = 200;
    /// Minimum time in seconds the question is displayed before answering opens
    pub const MIN_QUESTION_DURATION: u64 = 0;
    /// Maximum time in seconds the question is displayed before answering opens
    pub const MAX_QUESTION_DURATION: u64 = 60;
    /// Minimum answering window in seconds
    pub const MIN_ANSWERING_DURATION: u64 = 1;
    /// Maximum answering window in seconds
    pub const MAX_ANSWERING_DURATION: u64 = 300;
}

/// Phase timing constants
pub mod timing {
    /// Default grace period in seconds between answering close and the reveal intent
    pub const DEFAULT_GRACE: u64 = 5;
    /// Minimum grace period in seconds
    pub const MIN_GRACE: u64 = 1;
    /// Maximum grace period in seconds
    pub const MAX_GRACE: u64 = 30;
    /// Default countdown tick interval in seconds
    pub const DEFAULT_COUNTDOWN_TICK: u64 = 1;
    /// Minimum countdown tick interval in seconds
    pub const MIN_COUNTDOWN_TICK: u64 = 1;
    /// Maximum countdown tick interval in seconds
    pub const MAX_COUNTDOWN_TICK: u64 = 10;
}

/// Identifier constants
pub mod identifier {
    /// Maximum length of a session id, session code, quiz id or participant id
    pub const MAX_LENGTH: usize = 64;
}

/// Participant name constants
pub mod name {
    /// Maximum length of a participant name in characters
    pub const MAX_LENGTH: usize = 30;
}

/// Persisted identity constants
pub mod storage {
    /// Key under which the bound session id is stored
    pub const SESSION_KEY: &str = "sessionId";
    /// Key under which the participant id is stored
    pub const PARTICIPANT_KEY: &str = "userId";
}

/// Leaderboard constants
pub mod leaderboard {
    /// Number of entries shown on the podium
    pub const PODIUM_SIZE: usize = 3;
    /// Fixed palette of avatar images assigned to participants
    pub const AVATAR_PALETTE: [&str; 10] = [
        "/images/clown-fish.png",
        "/images/elephant.png",
        "/images/hippo.png",
        "/images/ladybug.png",
        "/images/lion.png",
        "/images/mouse.png",
        "/images/owl.png",
        "/images/pig.png",
        "/images/rabbit.png",
        "/images/sheep.png",
    ];
}

/// Notices shown on the host's management page
pub mod notice {
    /// Shown when the server does not know the referenced quiz or session
    pub const INVALID_SESSION: &str =
        "Invalid Quiz Id. Make sure you have created the quiz first...";
    /// Shown between the end of answering and the reveal broadcast
    pub const WAITING_FOR_REVEAL: &str = "Waiting for correct answer to be revealed...";
    /// Shown once the server ended the quiz
    pub const QUIZ_ENDED: &str = "You reached the end of the quiz...";
    /// Shown on the leaderboard before anyone scored
    pub const NO_WINNERS: &str = "No winners yet";
}
