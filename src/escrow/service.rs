//! Escrow Service
//!
//! The serialized-transition front door to the ledger. Every mutating
//! operation validates all of its preconditions, invokes the value rail
//! where real money moves, then commits the ledger mutation and emits one
//! event. A failure at any point leaves the ledger untouched.
//!
//! The service takes `&mut self` for every mutation: callers provide the
//! per-ledger serialization (the relay wraps it in one lock), matching the
//! single-writer model the invariants assume.

use std::sync::Arc;

use tracing::info;

use crate::auth::recover::Signature;
use crate::auth::verifier::SessionVerifier;
use crate::core::amount::Amount;
use crate::core::clock::Clock;
use crate::core::identity::{GameId, PlayerId};
use crate::escrow::capture::{apply_capture, Piece};
use crate::escrow::config::EscrowConfig;
use crate::escrow::error::EscrowError;
use crate::escrow::events::{EndReason, EscrowEvent, EscrowEventData};
use crate::escrow::game::{CaptureId, Game, GameStatus, Payout};
use crate::escrow::rail::ValueRail;
use crate::escrow::registry::GameRegistry;
use crate::escrow::stats::{PlayerStats, SettledSide, StatsBook};

/// The escrow ledger core with its collaborators.
pub struct EscrowService {
    config: EscrowConfig,
    registry: GameRegistry,
    stats: StatsBook,
    verifier: SessionVerifier,
    rail: Arc<dyn ValueRail>,
    clock: Arc<dyn Clock>,
}

impl EscrowService {
    /// Create a service over an empty registry.
    pub fn new(
        config: EscrowConfig,
        verifier: SessionVerifier,
        rail: Arc<dyn ValueRail>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            registry: GameRegistry::new(),
            stats: StatsBook::new(),
            verifier,
            rail,
            clock,
        }
    }

    /// Ledger configuration.
    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    // =========================================================================
    // Mutating transitions
    // =========================================================================

    /// Create a game from the creator's deposit.
    pub fn create_game(
        &mut self,
        creator: PlayerId,
        deposit: Amount,
    ) -> Result<EscrowEvent, EscrowError> {
        self.check_deposit(deposit)?;
        self.rail.collect_deposit(creator, deposit)?;

        let now = self.clock.now();
        let game_id = self.registry.create_game(creator, deposit, now);

        info!(game_id = %game_id, creator = %creator.short(), deposit = %deposit, "game created");
        Ok(EscrowEvent::new(
            now,
            EscrowEventData::GameCreated { game_id, creator, deposit },
        ))
    }

    /// Join a waiting game as the second player.
    pub fn join_game(
        &mut self,
        game_id: GameId,
        joiner: PlayerId,
        deposit: Amount,
    ) -> Result<EscrowEvent, EscrowError> {
        // Validate everything before the rail moves money.
        let game = self.registry.get(game_id)?;
        if game.status != GameStatus::Waiting || game.player_b.is_some() {
            return Err(EscrowError::GameNotJoinable(game_id));
        }
        if game.player_a == joiner {
            return Err(EscrowError::SelfJoinForbidden);
        }
        self.check_deposit(deposit)?;

        self.rail.collect_deposit(joiner, deposit)?;

        let now = self.clock.now();
        self.registry.join_game(game_id, joiner, deposit, now)?;

        info!(game_id = %game_id, joiner = %joiner.short(), "player joined, game active");
        Ok(EscrowEvent::new(
            now,
            EscrowEventData::PlayerJoined { game_id, joiner, deposit },
        ))
    }

    /// Validate a session-authorization signature and mark the player
    /// authorized for the game.
    pub fn authorize_session(
        &mut self,
        game_id: GameId,
        player: PlayerId,
        signature: &Signature,
    ) -> Result<EscrowEvent, EscrowError> {
        let game = self.registry.get(game_id)?;
        if !game.is_player(player) {
            return Err(EscrowError::NotAPlayer);
        }

        let game = self.registry.get_mut(game_id)?;
        self.verifier.verify_session(game, player, signature)?;

        let now = self.clock.now();
        info!(game_id = %game_id, player = %player.short(), "session authorized");
        Ok(EscrowEvent::new(
            now,
            EscrowEventData::SessionAuthorized { game_id, player },
        ))
    }

    /// Apply a signed capture: verify authorization and replay, transfer
    /// the piece value, consume the capture id.
    pub fn capture_piece(
        &mut self,
        game_id: GameId,
        captor: PlayerId,
        piece: Piece,
        capture_id: CaptureId,
        signature: &Signature,
    ) -> Result<EscrowEvent, EscrowError> {
        let game = self.registry.get(game_id)?;
        if game.status != GameStatus::Active {
            return Err(EscrowError::GameNotActive(game_id));
        }
        if !game.is_player(captor) {
            return Err(EscrowError::NotAPlayer);
        }
        self.verifier
            .check_capture(game, captor, piece, capture_id, signature)?;
        // After the verifier: a replayed id at a full log still reports the
        // replay, not the capacity limit.
        if !game.captures.has_capacity() {
            return Err(EscrowError::CaptureLogFull(game_id));
        }

        let now = self.clock.now();
        let game = self.registry.get_mut(game_id)?;
        let value = apply_capture(game, captor, piece, &self.config.piece_values, now)?;
        // Transfer applied; consume the id so the same signature can never
        // apply twice.
        game.captures.record(capture_id);

        let opponent = game.opponent_of(captor).unwrap_or(game.player_a);
        let captor_balance = game.balance_of(captor).unwrap_or(Amount::ZERO);
        let opponent_balance = game.balance_of(opponent).unwrap_or(Amount::ZERO);

        info!(
            game_id = %game_id,
            captor = %captor.short(),
            piece = ?piece,
            value = %value,
            "piece captured"
        );
        Ok(EscrowEvent::new(
            now,
            EscrowEventData::PieceCaptured {
                game_id,
                captor,
                piece,
                value,
                captor_balance,
                opponent_balance,
            },
        ))
    }

    /// Settle an active game with the given winner.
    pub fn end_game(
        &mut self,
        game_id: GameId,
        caller: PlayerId,
        winner: PlayerId,
    ) -> Result<EscrowEvent, EscrowError> {
        let game = self.registry.get(game_id)?;
        // A settled game with unpaid sides accepts a resubmission of the
        // same outcome to finish its payouts.
        if game.status == GameStatus::Finished && game.has_pending_payouts() {
            if !game.is_player(caller) {
                return Err(EscrowError::NotAPlayer);
            }
            if game.winner != Some(winner) {
                return Err(EscrowError::InvalidWinner);
            }
            return self.resume_settlement(game_id, EndReason::Reported);
        }
        if game.status != GameStatus::Active {
            return Err(EscrowError::GameNotActive(game_id));
        }
        if !game.is_player(caller) {
            return Err(EscrowError::NotAPlayer);
        }
        if !game.is_player(winner) {
            return Err(EscrowError::InvalidWinner);
        }
        self.settle(game_id, winner, EndReason::Reported)
    }

    /// Claim a timeout win: the window since the last move has elapsed and
    /// the claimant takes the game through the normal settlement path.
    pub fn claim_timeout(
        &mut self,
        game_id: GameId,
        claimant: PlayerId,
    ) -> Result<EscrowEvent, EscrowError> {
        let game = self.registry.get(game_id)?;
        if game.status == GameStatus::Finished && game.has_pending_payouts() {
            if !game.is_player(claimant) {
                return Err(EscrowError::NotAPlayer);
            }
            return self.resume_settlement(game_id, EndReason::Timeout);
        }
        if game.status != GameStatus::Active {
            return Err(EscrowError::GameNotActive(game_id));
        }
        if !game.is_player(claimant) {
            return Err(EscrowError::NotAPlayer);
        }
        let now = self.clock.now();
        if now < game.last_move_at + self.config.move_timeout {
            return Err(EscrowError::GameNotTimedOut(game_id));
        }
        self.settle(game_id, claimant, EndReason::Timeout)
    }

    /// Cancel a waiting game after the grace period and refund the creator.
    pub fn cancel_game(
        &mut self,
        game_id: GameId,
        requester: PlayerId,
    ) -> Result<EscrowEvent, EscrowError> {
        let game = self.registry.get(game_id)?;
        if game.status != GameStatus::Waiting {
            return Err(EscrowError::NotCancellable(game_id));
        }
        if game.player_a != requester {
            return Err(EscrowError::NotCreator);
        }
        let now = self.clock.now();
        if now < game.created_at + self.config.creation_grace {
            return Err(EscrowError::GracePeriodActive);
        }

        let refund = game.escrow_a;
        self.rail.pay_out(requester, refund)?;

        let game = self.registry.get_mut(game_id)?;
        // Escrow zeroed so a replayed cancel can never refund twice.
        game.escrow_a.take();
        game.balance_a.take();
        game.status = GameStatus::Cancelled;

        info!(game_id = %game_id, refunded = %refund, "game cancelled");
        Ok(EscrowEvent::new(
            now,
            EscrowEventData::GameCancelled { game_id, refunded: refund },
        ))
    }

    /// Shared settlement path for reported ends and timeout claims.
    ///
    /// All preconditions were checked by the caller. The terminal transition
    /// commits first (status, winner, payouts fixed from current balances,
    /// statistics); only then do the rail payouts run. A rail failure leaves
    /// the unpaid sides pending rather than re-arming the settlement, so a
    /// resubmitted operation can never pay a side twice.
    fn settle(
        &mut self,
        game_id: GameId,
        winner: PlayerId,
        reason: EndReason,
    ) -> Result<EscrowEvent, EscrowError> {
        let now = self.clock.now();
        let game = self.registry.get_mut(game_id)?;
        let player_a = game.player_a;
        // Active games always have a second player.
        let player_b = game.player_b.ok_or(EscrowError::InvalidWinner)?;

        // Commit: balances drained into the fixed payout records, status
        // terminal. Stale captures are gated by status and inert on zero
        // balances.
        let payout_a = game.balance_a.take();
        let payout_b = game.balance_b.take();
        let escrow_a = game.escrow_a;
        let escrow_b = game.escrow_b;
        game.status = GameStatus::Finished;
        game.winner = Some(winner);
        game.payouts = vec![
            Payout { player: player_a, amount: payout_a, paid: false },
            Payout { player: player_b, amount: payout_b, paid: false },
        ];

        let (winner_side, loser_side) = if winner == player_a {
            (
                SettledSide { player: player_a, payout: payout_a, escrow: escrow_a },
                SettledSide { player: player_b, payout: payout_b, escrow: escrow_b },
            )
        } else {
            (
                SettledSide { player: player_b, payout: payout_b, escrow: escrow_b },
                SettledSide { player: player_a, payout: payout_a, escrow: escrow_a },
            )
        };
        self.stats.record_settlement(game_id, winner_side, loser_side);

        info!(
            game_id = %game_id,
            winner = %winner.short(),
            payout_a = %payout_a,
            payout_b = %payout_b,
            reason = ?reason,
            "game settled"
        );

        // Rail last: the settlement above is final either way.
        self.flush_payouts(game_id)?;

        Ok(EscrowEvent::new(
            now,
            EscrowEventData::GameEnded { game_id, winner, payout_a, payout_b, reason },
        ))
    }

    /// Push committed settlement payouts onto the rail, marking each side
    /// as it clears. A zero payout is a no-op, not an error.
    ///
    /// A rail failure leaves the remaining sides pending; already-cleared
    /// sides are never retried.
    fn flush_payouts(&mut self, game_id: GameId) -> Result<(), EscrowError> {
        let game = self.registry.get_mut(game_id)?;
        for payout in game.payouts.iter_mut() {
            if payout.paid || payout.amount.is_zero() {
                continue;
            }
            self.rail.pay_out(payout.player, payout.amount)?;
            payout.paid = true;
        }
        Ok(())
    }

    /// Finish a settlement whose rail payouts did not all clear.
    fn resume_settlement(
        &mut self,
        game_id: GameId,
        reason: EndReason,
    ) -> Result<EscrowEvent, EscrowError> {
        self.flush_payouts(game_id)?;

        let now = self.clock.now();
        let game = self.registry.get(game_id)?;
        let winner = game.winner.ok_or(EscrowError::InvalidWinner)?;
        let payout_a = game.payout_for(game.player_a);
        let payout_b = game
            .player_b
            .map(|b| game.payout_for(b))
            .unwrap_or(Amount::ZERO);

        info!(game_id = %game_id, "pending settlement payouts flushed");
        Ok(EscrowEvent::new(
            now,
            EscrowEventData::GameEnded { game_id, winner, payout_a, payout_b, reason },
        ))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read-only game snapshot.
    pub fn game(&self, game_id: GameId) -> Result<&Game, EscrowError> {
        self.registry.get(game_id)
    }

    /// Lifetime statistics for a player, if any settlement involved them.
    pub fn player_stats(&self, player: PlayerId) -> Option<&PlayerStats> {
        self.stats.stats(player)
    }

    /// Reverse-chronological page of a player's settled game ids.
    pub fn player_game_history(&self, player: PlayerId, limit: usize, offset: usize) -> Vec<GameId> {
        self.stats.game_history(player, limit, offset)
    }

    /// Registry accessor for snapshot persistence.
    pub fn registry(&self) -> &GameRegistry {
        &self.registry
    }

    /// Statistics accessor for snapshot persistence.
    pub fn stats_book(&self) -> &StatsBook {
        &self.stats
    }

    /// Replace durable state from a restored snapshot.
    pub fn restore(&mut self, registry: GameRegistry, stats: StatsBook) {
        self.registry = registry;
        self.stats = stats;
    }

    fn check_deposit(&self, deposit: Amount) -> Result<(), EscrowError> {
        if deposit != self.config.escrow_amount {
            return Err(EscrowError::InvalidDeposit {
                expected: self.config.escrow_amount,
                got: deposit,
            });
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================


// =============================================================================
// PROPERTY TESTS
// =============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::auth::message::{capture_digest, session_digest};
    use crate::auth::recover::LocalKeyRecovery;
    use crate::core::clock::ManualClock;
    use crate::escrow::rail::RecordingRail;
    use chrono::Utc;
    use proptest::prelude::*;

    fn piece_strategy() -> impl Strategy<Value = Piece> {
        prop_oneof![
            Just(Piece::Pawn),
            Just(Piece::Knight),
            Just(Piece::Bishop),
            Just(Piece::Rook),
            Just(Piece::Queen),
        ]
    }

    proptest! {
        /// Conservation: any sequence of valid captures keeps the balance
        /// sum equal to total escrow.
        #[test]
        fn conservation_under_capture_sequences(
            moves in proptest::collection::vec((any::<bool>(), piece_strategy()), 0..25)
        ) {
            let oracle = std::sync::Arc::new(LocalKeyRecovery::new());
            let alice = PlayerId::derive("alice");
            let bob = PlayerId::derive("bob");
            oracle.register(alice, b"alice-secret".to_vec());
            oracle.register(bob, b"bob-secret".to_vec());

            let config = EscrowConfig::default();
            let deposit = config.escrow_amount;
            let verifier = SessionVerifier::new(config.domain_id, oracle.clone());
            let clock = std::sync::Arc::new(ManualClock::starting_at(Utc::now()));
            let rail = std::sync::Arc::new(RecordingRail::new());
            let mut service = EscrowService::new(config, verifier, rail, clock);

            let game_id = service.create_game(alice, deposit).unwrap().game_id();
            service.join_game(game_id, bob, deposit).unwrap();
            for player in [alice, bob] {
                let sig = oracle.sign(player, &session_digest(1, game_id)).unwrap();
                service.authorize_session(game_id, player, &sig).unwrap();
            }

            for (alice_moves, piece) in moves {
                let captor = if alice_moves { alice } else { bob };
                let sig = oracle
                    .sign(captor, &capture_digest(1, game_id, captor, piece))
                    .unwrap();
                // Insufficient balance is a legal rejection; the invariant
                // must hold either way.
                let _ = service.capture_piece(
                    game_id,
                    captor,
                    piece,
                    CaptureId::generate(),
                    &sig,
                );

                let game = service.game(game_id).unwrap();
                prop_assert!(game.balances_conserved());
                prop_assert_eq!(game.total_escrow(), Amount::from_units(5));
            }
        }
    }
}
