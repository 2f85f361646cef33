//! Submit-and-await logic shared by every game handler.

use super::{HandlerContext, HandlerError, Outcome};
use crate::{
    correlation::{self, ensure_open, release_if_idle, wait_for_event},
    ledger::{self, Ledger},
    nonce,
};
use nullspace_types::{Event, EventKind, GameType, Instruction};
use tracing::{debug, info, warn};

/// Sign `instruction` with the next nonce and hand it to the ledger.
async fn submit<L: Ledger>(
    ctx: &mut HandlerContext<'_, L>,
    instruction: Instruction,
) -> Result<(), HandlerError> {
    let public = ctx.session.public_key().clone();
    let reservation = ctx
        .nonces
        .reserve(ctx.ledger, &public)
        .await
        .map_err(|err| {
            warn!(error = ?err, "failed to reserve nonce");
            HandlerError::ledger_unavailable()
        })?;
    let nonce = reservation.nonce();
    let transaction = ctx.session.sign(nonce, instruction);

    match ctx.ledger.submit(transaction).await {
        Ok(()) => {
            reservation.commit();
            debug!(nonce, ledger = %ctx.ledger_url, "submitted transaction");
            Ok(())
        }
        Err(ledger::Error::Rejected(rejection)) => match rejection.expected_nonce() {
            Some(expected) => {
                warn!(nonce, expected, "stale nonce rejected, adopting ledger nonce");
                reservation.adopt(expected);
                Err(HandlerError::nonce_mismatch())
            }
            None => {
                warn!(nonce, %rejection, "submission rejected");
                drop(reservation);
                Err(HandlerError::submit_rejected())
            }
        },
        Err(err) => {
            warn!(nonce, error = ?err, "submission failed");
            Err(HandlerError::ledger_unavailable())
        }
    }
}

/// Best-effort nonce check after a wait timed out.
///
/// A ledger that moved ahead is adopted. A ledger behind local state usually means the
/// timed-out transaction is still pending, so the local nonce is kept: rolling back would sign
/// the next transaction with a nonce the ledger already accepted. If it never lands, the next
/// submission is rejected with the expected nonce and adopts it from there.
async fn reconcile_after_timeout<L: Ledger>(ctx: &mut HandlerContext<'_, L>) {
    let public = ctx.session.public_key().clone();
    match ctx.nonces.verify_against_chain(ctx.ledger, &public).await {
        Ok(next) => debug!(next, "nonce consistent after timeout"),
        Err(nonce::Error::Diverged { local, chain }) => {
            warn!(local, chain, "ledger behind local nonce after timeout, keeping local");
        }
        Err(err) => warn!(error = ?err, "nonce reconciliation failed"),
    }
}

fn wait_failure(err: correlation::Error) -> HandlerError {
    match err {
        correlation::Error::Timeout(_) => HandlerError::timeout(),
        correlation::Error::Ledger(err) => {
            warn!(error = ?err, "event subscription failed");
            HandlerError::ledger_unavailable()
        }
    }
}

/// Start a game of `game_type` with `bet` and wait for the ledger to confirm it.
///
/// Every call is a new attempt with its own game id. On failure no game is left active.
pub async fn start_game<L: Ledger>(
    ctx: &mut HandlerContext<'_, L>,
    game_type: GameType,
    bet: u64,
) -> Result<Outcome, HandlerError> {
    let game_id = ctx.session.begin_attempt();
    info!(game_id, game = %game_type, bet, "starting game");
    let result = start(ctx, game_type, bet, game_id).await;
    if let Err(err) = &result {
        info!(game_id, code = %err.code, "game start failed");
        ctx.session.clear_game();
        release_if_idle(ctx.session);
    }
    result
}

async fn start<L: Ledger>(
    ctx: &mut HandlerContext<'_, L>,
    game_type: GameType,
    bet: u64,
    game_id: u64,
) -> Result<Outcome, HandlerError> {
    ensure_open(ctx.session, ctx.ledger)
        .await
        .map_err(wait_failure)?;
    submit(
        ctx,
        Instruction::CasinoStartGame {
            game_type,
            bet,
            session_id: game_id,
        },
    )
    .await?;

    let expected = [EventKind::Started, EventKind::Error];
    match wait_for_event(ctx.session, &expected, game_id, ctx.event_timeout).await {
        Ok(Event::CasinoGameStarted {
            session_id,
            game_type,
            bet,
            initial_state,
            ..
        }) => {
            ctx.session
                .start(game_type, session_id, initial_state.clone());
            Ok(Outcome::Started {
                session_id,
                game_type,
                bet,
                state: initial_state,
            })
        }
        Ok(Event::CasinoError {
            error_code,
            message,
            ..
        }) => Err(HandlerError::chain(error_code, &message)),
        Ok(other) => {
            warn!(kind = ?other.kind(), "unexpected event while starting");
            Err(HandlerError::new(super::ErrorCode::GameError, "unexpected ledger event"))
        }
        Err(err) => {
            if matches!(err, correlation::Error::Timeout(_)) {
                reconcile_after_timeout(ctx).await;
            }
            Err(wait_failure(err))
        }
    }
}

/// Submit `payload` as a move in the active `game_type` game and wait for its result.
///
/// A move addressed to a game other than the active one fails locally. A timed-out move keeps
/// the game active since it may still land. An error event ends it.
pub async fn make_move<L: Ledger>(
    ctx: &mut HandlerContext<'_, L>,
    game_type: GameType,
    payload: Vec<u8>,
) -> Result<Outcome, HandlerError> {
    let game_id = match (ctx.session.active_game_id(), ctx.session.game_type()) {
        (Some(game_id), Some(active)) if active == game_type => game_id,
        (Some(_), Some(active)) => return Err(HandlerError::game_in_progress(active)),
        _ => return Err(HandlerError::no_active_game()),
    };
    debug!(game_id, opcode = ?payload.first(), "making move");
    ensure_open(ctx.session, ctx.ledger)
        .await
        .map_err(wait_failure)?;
    submit(
        ctx,
        Instruction::CasinoGameMove {
            session_id: game_id,
            payload,
        },
    )
    .await?;

    let expected = [EventKind::Moved, EventKind::Completed, EventKind::Error];
    match wait_for_event(ctx.session, &expected, game_id, ctx.event_timeout).await {
        Ok(Event::CasinoGameMoved {
            session_id,
            move_number,
            new_state,
        }) => {
            ctx.session.record_move(new_state.clone());
            Ok(Outcome::Moved {
                session_id,
                move_number,
                state: new_state,
            })
        }
        Ok(Event::CasinoGameCompleted {
            session_id,
            game_type,
            payout,
            final_chips,
            was_shielded,
            was_doubled,
            ..
        }) => {
            info!(game_id, payout, final_chips, "game completed");
            ctx.session.complete();
            release_if_idle(ctx.session);
            Ok(Outcome::Completed {
                session_id,
                game_type,
                payout,
                final_chips,
                was_shielded,
                was_doubled,
            })
        }
        Ok(Event::CasinoError {
            error_code,
            message,
            ..
        }) => {
            info!(game_id, error_code, "move failed on chain");
            ctx.session.clear_game();
            release_if_idle(ctx.session);
            Err(HandlerError::chain(error_code, &message))
        }
        Ok(other) => {
            warn!(kind = ?other.kind(), "unexpected event while moving");
            Err(HandlerError::new(super::ErrorCode::GameError, "unexpected ledger event"))
        }
        Err(err) => {
            if matches!(err, correlation::Error::Timeout(_)) {
                reconcile_after_timeout(ctx).await;
            }
            Err(wait_failure(err))
        }
    }
}

/// Start a game, then submit `moves` in order until one completes the game.
pub async fn start_with_moves<L: Ledger>(
    ctx: &mut HandlerContext<'_, L>,
    game_type: GameType,
    bet: u64,
    moves: Vec<Vec<u8>>,
) -> Result<Outcome, HandlerError> {
    let mut outcome = start_game(ctx, game_type, bet).await?;
    for payload in moves {
        if outcome.is_completed() {
            break;
        }
        outcome = make_move(ctx, game_type, payload).await?;
    }
    Ok(outcome)
}

/// Submit `payload`, then `follow_up` when the first move left the game waiting on it.
pub async fn move_then<L: Ledger>(
    ctx: &mut HandlerContext<'_, L>,
    game_type: GameType,
    payload: Vec<u8>,
    follow_up: impl FnOnce(&Outcome) -> Option<Vec<u8>>,
) -> Result<Outcome, HandlerError> {
    let outcome = make_move(ctx, game_type, payload).await?;
    match follow_up(&outcome) {
        Some(next) => make_move(ctx, game_type, next).await,
        None => Ok(outcome),
    }
}
