//! Leaderboard merging
//!
//! The server pushes the ranked list of winners without any presentation
//! data. Each participant is decorated locally with an avatar drawn from a
//! fixed palette; once a participant has an avatar it keeps it across every
//! later push, so the board never flickers as scores change.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    constants::leaderboard::{AVATAR_PALETTE, PODIUM_SIZE},
    participant::ParticipantId,
};

/// One entry of a winners push, already ordered by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerEntry {
    /// Participant the entry belongs to
    pub id: ParticipantId,
    /// Display name
    pub name: String,
    /// Total score
    pub score: u64,
}

/// Index into the avatar palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Avatar(usize);

impl Avatar {
    /// Image path of the avatar
    pub fn path(self) -> &'static str {
        AVATAR_PALETTE[self.0 % AVATAR_PALETTE.len()]
    }
}

/// A merged entry: the pushed data plus the local avatar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// Participant the entry belongs to
    pub id: ParticipantId,
    /// Display name
    pub name: String,
    /// Total score
    pub score: u64,
    /// Locally assigned avatar
    pub avatar: Avatar,
}

/// A standing together with its 1-based rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankedStanding<'a> {
    /// 1-based position in the pushed order
    pub rank: usize,
    /// The standing at that position
    pub standing: &'a Standing,
}

/// The last pushed winners, decorated with stable avatars
#[derive(Debug)]
pub struct Leaderboard {
    standings: Vec<Standing>,
    avatars: HashMap<ParticipantId, Avatar>,
    rng: fastrand::Rng,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Leaderboard {
    /// Creates an empty leaderboard with a randomly seeded avatar picker
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    /// Creates an empty leaderboard with a deterministic avatar picker
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            standings: Vec::new(),
            avatars: HashMap::new(),
            rng,
        }
    }

    /// Replaces the standings with a new push
    ///
    /// Participants seen in any earlier push keep their avatar; new ones get
    /// an independently drawn avatar. The pushed order is kept as is.
    pub fn merge(&mut self, entries: Vec<WinnerEntry>) {
        let avatars = &mut self.avatars;
        let rng = &mut self.rng;
        let mut assigned = 0;

        let standings = entries
            .into_iter()
            .map(|WinnerEntry { id, name, score }| {
                let avatar = *avatars.entry(id.clone()).or_insert_with(|| {
                    assigned += 1;
                    Avatar(rng.usize(..AVATAR_PALETTE.len()))
                });
                Standing {
                    id,
                    name,
                    score,
                    avatar,
                }
            })
            .collect_vec();
        self.standings = standings;

        debug!(
            entries = self.standings.len(),
            new_avatars = assigned,
            "merged winners"
        );
    }

    /// Every standing in the pushed order
    pub fn standings(&self) -> &[Standing] {
        &self.standings
    }

    /// Every standing with its 1-based rank
    pub fn ranked(&self) -> impl Iterator<Item = RankedStanding<'_>> {
        self.standings
            .iter()
            .enumerate()
            .map(|(i, standing)| RankedStanding {
                rank: i + 1,
                standing,
            })
    }

    /// The top standings shown on the podium
    pub fn podium(&self) -> impl Iterator<Item = RankedStanding<'_>> {
        self.ranked().take(PODIUM_SIZE)
    }

    /// Whether no winners were pushed yet, or the last push was empty
    pub fn is_empty(&self) -> bool {
        self.standings.is_empty()
    }

    /// The avatar assigned to `id`, if it was ever seen
    pub fn avatar_of(&self, id: &ParticipantId) -> Option<Avatar> {
        self.avatars.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ParticipantId {
        ParticipantId::from(n)
    }

    fn entry(n: u64, name: &str, score: u64) -> WinnerEntry {
        WinnerEntry {
            id: id(n),
            name: name.to_string(),
            score,
        }
    }

    #[test]
    fn test_merge_keeps_avatar_across_pushes() {
        let mut board = Leaderboard::with_seed(7);
        board.merge(vec![entry(1, "Ada", 5)]);
        let avatar = board.standings()[0].avatar;

        board.merge(vec![entry(1, "Ada", 9)]);
        assert_eq!(board.standings()[0].avatar, avatar);
        assert_eq!(board.standings()[0].score, 9);
    }

    #[test]
    fn test_merge_keeps_avatars_for_many_pushes() {
        let mut board = Leaderboard::new();
        board.merge((0..20u64).map(|i| entry(i, "p", i)).collect());
        let before = (0..20u64)
            .map(|i| board.avatar_of(&id(i)).unwrap())
            .collect_vec();

        for round in 0..10u64 {
            board.merge((0..20u64).rev().map(|i| entry(i, "p", i * round)).collect());
        }

        for (i, avatar) in (0..20u64).zip(before) {
            assert_eq!(board.avatar_of(&id(i)), Some(avatar));
        }
        assert_eq!(board.standings()[0].id, id(19));
    }

    #[test]
    fn test_merge_remembers_absent_participants() {
        let mut board = Leaderboard::with_seed(1);
        board.merge(vec![entry(1, "Ada", 5), entry(2, "Bob", 3)]);
        let bob = board.avatar_of(&id(2)).unwrap();

        board.merge(vec![entry(1, "Ada", 6)]);
        board.merge(vec![entry(2, "Bob", 8), entry(1, "Ada", 6)]);
        assert_eq!(board.standings()[0].avatar, bob);
    }

    #[test]
    fn test_avatar_paths_are_from_palette() {
        let mut board = Leaderboard::new();
        board.merge((0..50u64).map(|i| entry(i, "p", 0)).collect());
        assert!(
            board
                .standings()
                .iter()
                .all(|s| AVATAR_PALETTE.contains(&s.avatar.path()))
        );
    }

    #[test]
    fn test_podium_and_ranks() {
        let mut board = Leaderboard::new();
        board.merge(vec![
            entry(4, "D", 40),
            entry(3, "C", 30),
            entry(2, "B", 20),
            entry(1, "A", 10),
        ]);

        let podium = board.podium().map(|r| (r.rank, r.standing.name.as_str())).collect_vec();
        assert_eq!(podium, vec![(1, "D"), (2, "C"), (3, "B")]);
        assert_eq!(board.ranked().last().map(|r| r.rank), Some(4));
    }

    #[test]
    fn test_empty_board() {
        let mut board = Leaderboard::new();
        assert!(board.is_empty());
        board.merge(vec![entry(1, "A", 1)]);
        board.merge(Vec::new());
        assert!(board.is_empty());
        assert_eq!(board.podium().count(), 0);
    }
}
