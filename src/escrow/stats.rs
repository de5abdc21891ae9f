//! Player Statistics Aggregator
//!
//! Derived per-player counters, written only at settlement. Entries are
//! created lazily the first time an identity settles a game; counters are
//! monotonically non-decreasing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::amount::Amount;
use crate::core::identity::{GameId, PlayerId};

/// Lifetime statistics for one player identity.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Settled games this player took part in.
    pub games_played: u32,
    /// Games settled with this player as winner.
    pub games_won: u32,
    /// Games settled with this player as loser.
    pub games_lost: u32,
    /// Cumulative payout surplus over escrow across winning settlements.
    pub total_earned: Amount,
    /// Cumulative payout deficit under escrow across losing settlements.
    pub total_lost: Amount,
    /// Settled game ids, newest last.
    pub game_history: Vec<GameId>,
}

/// One settled side of a game, as fed to the aggregator.
#[derive(Clone, Copy, Debug)]
pub struct SettledSide {
    /// The player on this side.
    pub player: PlayerId,
    /// Final balance paid out at settlement.
    pub payout: Amount,
    /// The escrow this player originally deposited.
    pub escrow: Amount,
}

/// All players' statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsBook {
    players: BTreeMap<PlayerId, PlayerStats>,
}

impl StatsBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one game settlement for both sides.
    pub fn record_settlement(&mut self, game_id: GameId, winner: SettledSide, loser: SettledSide) {
        let w = self.players.entry(winner.player).or_default();
        w.games_played += 1;
        w.games_won += 1;
        if let Some(surplus) = winner.payout.checked_sub(winner.escrow) {
            w.total_earned += surplus;
        }
        w.game_history.push(game_id);

        let l = self.players.entry(loser.player).or_default();
        l.games_played += 1;
        l.games_lost += 1;
        if let Some(deficit) = loser.escrow.checked_sub(loser.payout) {
            l.total_lost += deficit;
        }
        l.game_history.push(game_id);
    }

    /// Statistics for a player, if any settlement ever involved them.
    pub fn stats(&self, player: PlayerId) -> Option<&PlayerStats> {
        self.players.get(&player)
    }

    /// Reverse-chronological page of a player's settled game ids.
    pub fn game_history(&self, player: PlayerId, limit: usize, offset: usize) -> Vec<GameId> {
        match self.players.get(&player) {
            Some(stats) => stats
                .game_history
                .iter()
                .rev()
                .skip(offset)
                .take(limit)
                .copied()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Number of players with at least one settlement.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn side(label: &str, payout: Amount, escrow: Amount) -> SettledSide {
        SettledSide {
            player: PlayerId::derive(label),
            payout,
            escrow,
        }
    }

    #[test]
    fn test_settlement_updates_both_sides() {
        let mut book = StatsBook::new();
        let escrow = Amount::from_centi(2, 50);

        book.record_settlement(
            GameId(1),
            side("alice", Amount::from_centi(2, 55), escrow),
            side("bob", Amount::from_centi(2, 45), escrow),
        );

        let alice = book.stats(PlayerId::derive("alice")).unwrap();
        assert_eq!(alice.games_played, 1);
        assert_eq!(alice.games_won, 1);
        assert_eq!(alice.games_lost, 0);
        assert_eq!(alice.total_earned, Amount::from_centi(0, 5));
        assert!(alice.total_lost.is_zero());

        let bob = book.stats(PlayerId::derive("bob")).unwrap();
        assert_eq!(bob.games_played, 1);
        assert_eq!(bob.games_lost, 1);
        assert_eq!(bob.total_lost, Amount::from_centi(0, 5));
        assert!(bob.total_earned.is_zero());
    }

    #[test]
    fn test_counters_are_monotonic() {
        let mut book = StatsBook::new();
        let escrow = Amount::from_centi(2, 50);

        let mut last_played = 0;
        for i in 0..5 {
            let (winner, loser) = if i % 2 == 0 {
                ("alice", "bob")
            } else {
                ("bob", "alice")
            };
            book.record_settlement(
                GameId(i),
                side(winner, Amount::from_units(5), escrow),
                side(loser, Amount::ZERO, escrow),
            );

            let alice = book.stats(PlayerId::derive("alice")).unwrap();
            assert!(alice.games_played > last_played || alice.games_played == last_played + 1);
            assert!(alice.games_won + alice.games_lost <= alice.games_played);
            last_played = alice.games_played;
        }
    }

    #[test]
    fn test_history_is_reverse_chronological_and_paginated() {
        let mut book = StatsBook::new();
        let escrow = Amount::from_centi(2, 50);
        for i in 1..=5 {
            book.record_settlement(
                GameId(i),
                side("alice", escrow, escrow),
                side("bob", escrow, escrow),
            );
        }

        let alice = PlayerId::derive("alice");
        assert_eq!(
            book.game_history(alice, 3, 0),
            vec![GameId(5), GameId(4), GameId(3)]
        );
        assert_eq!(book.game_history(alice, 3, 3), vec![GameId(2), GameId(1)]);
        assert!(book.game_history(PlayerId::derive("nobody"), 10, 0).is_empty());
    }

    #[test]
    fn test_even_settlement_moves_no_lifetime_amounts() {
        let mut book = StatsBook::new();
        let escrow = Amount::from_centi(2, 50);
        book.record_settlement(
            GameId(1),
            side("alice", escrow, escrow),
            side("bob", escrow, escrow),
        );

        assert!(book.stats(PlayerId::derive("alice")).unwrap().total_earned.is_zero());
        assert!(book.stats(PlayerId::derive("bob")).unwrap().total_lost.is_zero());
    }
}
