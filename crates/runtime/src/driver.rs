//! Async game driver.
//!
//! Runs one [`GameState`] on a single task: a frame interval feeds it measured
//! elapsed time and player commands arrive over an mpsc channel. Both are
//! handled inside one `select!`, so state is only ever touched by this task.
//!
//! Every command carries the generation of the attempt it was issued for. A
//! command for any other generation was queued before an attempt ended and is
//! dropped.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use conveyor_sorter_core::{
    Economy, GameEvent, GameState, Generation, ItemTicket, LevelError, LevelSnapshot,
};
use conveyor_sorter_types::{BinType, TICK_MS};

use crate::event_log::EventLog;

/// Bound on queued player commands.
pub const COMMAND_QUEUE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Grab(ItemTicket),
    /// Let go of the held item, over a bin or back onto the belt.
    Release(Option<BinType>),
    Drop { ticket: ItemTicket, bin: BinType },
    Abort,
    NextAttempt,
    /// Abort if still playing, then stop the driver.
    Shutdown,
}

/// A command stamped with the attempt it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub generation: Generation,
    pub command: Command,
}

impl Envelope {
    pub fn new(generation: Generation, command: Command) -> Self {
        Self {
            generation,
            command,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// State after a frame or a command, with everything that happened since
    /// the previous update.
    Frame {
        events: Vec<GameEvent>,
        snapshot: LevelSnapshot,
    },
    /// The command's generation is not the current attempt.
    Stale {
        command: Command,
        sent: Generation,
        current: Generation,
    },
    /// The game refused the command.
    Rejected { command: Command, error: LevelError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    pub frame_ms: u32,
    /// Game milliseconds per elapsed wall-clock millisecond.
    pub speed: u32,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            frame_ms: TICK_MS,
            speed: 1,
        }
    }
}

enum Flow {
    Continue,
    Stop,
}

/// Drive `game` until a `Shutdown` command arrives or every command sender is
/// dropped. Returns the game so callers can inspect the final state.
pub async fn run_driver<E: Economy>(
    mut game: GameState<E>,
    options: DriverOptions,
    mut cmd_rx: mpsc::Receiver<Envelope>,
    update_tx: mpsc::UnboundedSender<Update>,
    event_log: Option<EventLog>,
) -> Result<GameState<E>> {
    let speed = options.speed.max(1);
    let mut frames = time::interval(Duration::from_millis(options.frame_ms.max(1) as u64));
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);

    game.start();
    publish(&mut game, &update_tx, event_log.as_ref());

    let mut last = Instant::now();
    loop {
        tokio::select! {
            _ = frames.tick() => {
                // Carry sub-millisecond remainders into the next frame.
                let elapsed = last.elapsed().as_millis().min(u32::MAX as u128) as u32;
                last += Duration::from_millis(elapsed as u64);
                game.advance(elapsed.saturating_mul(speed));
                publish(&mut game, &update_tx, event_log.as_ref());
            }
            envelope = cmd_rx.recv() => {
                let Some(envelope) = envelope else {
                    debug!("command channel closed");
                    break;
                };
                let flow = apply(&mut game, envelope, &update_tx);
                publish(&mut game, &update_tx, event_log.as_ref());
                if let Flow::Stop = flow {
                    break;
                }
            }
        }
    }

    if let Some(log) = event_log {
        log.close().await;
    }
    info!(
        generation = game.generation().0,
        balance = game.economy().balance(),
        "driver stopped"
    );
    Ok(game)
}

fn apply<E: Economy>(
    game: &mut GameState<E>,
    envelope: Envelope,
    update_tx: &mpsc::UnboundedSender<Update>,
) -> Flow {
    let Envelope {
        generation,
        command,
    } = envelope;

    if command == Command::Shutdown {
        if game.is_live() {
            let _ = game.abort();
        }
        return Flow::Stop;
    }

    let current = game.generation();
    if generation != current {
        warn!(
            sent = generation.0,
            current = current.0,
            ?command,
            "stale command dropped"
        );
        let _ = update_tx.send(Update::Stale {
            command,
            sent: generation,
            current,
        });
        return Flow::Continue;
    }

    let result = match command {
        Command::Grab(ticket) => game.grab(ticket).map(|_| ()),
        Command::Release(bin) => game.release(bin).map(|_| ()),
        Command::Drop { ticket, bin } => game.drop_item(ticket, bin).map(|_| ()),
        Command::Abort => game.abort().map(|_| ()),
        Command::NextAttempt => game.next_attempt(),
        Command::Shutdown => Ok(()),
    };

    if let Err(error) = result {
        warn!(%error, ?command, "command rejected");
        let _ = update_tx.send(Update::Rejected { command, error });
    }
    Flow::Continue
}

fn publish<E: Economy>(
    game: &mut GameState<E>,
    update_tx: &mpsc::UnboundedSender<Update>,
    event_log: Option<&EventLog>,
) {
    let events = game.drain_events();
    if let Some(log) = event_log {
        for event in &events {
            log.record(event);
        }
    }
    let _ = update_tx.send(Update::Frame {
        events,
        snapshot: game.snapshot(),
    });
}
