//! Chess Escrow Server
//!
//! Runs a demo game lifecycle through the escrow ledger, then serves the
//! gas-sponsorship relay.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chess_escrow::auth::{capture_digest, session_digest, LocalKeyRecovery, SessionVerifier};
use chess_escrow::core::{PlayerId, SystemClock};
use chess_escrow::escrow::{CaptureId, EscrowConfig, EscrowService, Piece, RecordingRail};
use chess_escrow::relay::{AllowList, RecordingBackend, RelayConfig, RelayServer};
use chess_escrow::VERSION;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Chess Escrow Server v{}", VERSION);

    let config = EscrowConfig::from_env();
    info!("Escrow amount: {}", config.escrow_amount);
    info!("Move timeout: {}s", config.move_timeout.num_seconds());
    info!("Creation grace: {}s", config.creation_grace.num_seconds());

    demo_game(config)?;

    // Serve the relay if a bind address is configured.
    if let Ok(addr) = std::env::var("RELAY_BIND_ADDR") {
        let relay_config = RelayConfig {
            bind_addr: addr.parse()?,
            ..Default::default()
        };
        let allowlist = AllowList::escrow_default("chess-escrow");
        let backend = Arc::new(RecordingBackend::new());
        let server = RelayServer::new(relay_config, allowlist, backend);
        server.run().await?;
    }

    Ok(())
}

/// Drive a full game lifecycle against an in-memory rail.
fn demo_game(config: EscrowConfig) -> Result<()> {
    info!("=== Demo Game ===");

    let oracle = Arc::new(LocalKeyRecovery::new());
    let alice = PlayerId::derive("alice");
    let bob = PlayerId::derive("bob");
    oracle.register(alice, b"alice-demo-key".to_vec());
    oracle.register(bob, b"bob-demo-key".to_vec());

    let domain = config.domain_id;
    let deposit = config.escrow_amount;
    let verifier = SessionVerifier::new(domain, oracle.clone());
    let rail = Arc::new(RecordingRail::new());
    let mut service = EscrowService::new(config, verifier, rail.clone(), Arc::new(SystemClock));

    // Create and join
    let game_id = service.create_game(alice, deposit)?.game_id();
    info!("Game {} created by {}", game_id, alice.short());
    service.join_game(game_id, bob, deposit)?;
    info!("{} joined game {}", bob.short(), game_id);

    // Both players authorize a session
    for player in [alice, bob] {
        let sig = oracle
            .sign(player, &session_digest(domain, game_id))
            .expect("demo key registered above");
        service.authorize_session(game_id, player, &sig)?;
    }

    // A few captures
    for (captor, piece) in [
        (alice, Piece::Pawn),
        (bob, Piece::Knight),
        (alice, Piece::Queen),
    ] {
        let sig = oracle
            .sign(captor, &capture_digest(domain, game_id, captor, piece))
            .expect("demo key registered above");
        let event = service.capture_piece(game_id, captor, piece, CaptureId::generate(), &sig)?;
        info!("Capture applied: {:?}", event.data);
    }

    let game = service.game(game_id)?;
    info!(
        "Balances: {} = {}, {} = {}",
        alice.short(),
        game.balance_a,
        bob.short(),
        game.balance_b
    );

    // Settle
    let event = service.end_game(game_id, alice, alice)?;
    info!("Settled: {:?}", event.data);

    for player in [alice, bob] {
        if let Some(stats) = service.player_stats(player) {
            info!(
                "{}: played={} won={} lost={} earned={} lost_amount={}",
                player.short(),
                stats.games_played,
                stats.games_won,
                stats.games_lost,
                stats.total_earned,
                stats.total_lost
            );
        }
    }

    info!("Rail custody after settlement: {}", rail.held());
    Ok(())
}
