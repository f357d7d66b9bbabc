//! Terminal conveyor sorter (default binary).
//!
//! Single-threaded loop: render, poll keys until the next tick, advance the
//! game. tracing output only goes to `CONVEYOR_LOG_FILE` since the screen is
//! owned by the renderer.

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use tracing::debug;

use conveyor_sorter::core::{Economy, GameState, Phase, Wallet};
use conveyor_sorter::runtime::{init_tracing, EventLog, RunnerConfig};
use conveyor_sorter::term::{map_key, step_lane, BeltView, FrameBuffer, TerminalRenderer, UiAction, Viewport};
use conveyor_sorter::types::TICK_MS;

fn main() -> Result<()> {
    let config = RunnerConfig::from_env();
    if config.log_file.is_some() {
        init_tracing(&config.log_filter, config.log_file.as_deref())?;
    }

    // The game loop stays sync. Recorded events queue until the log is closed,
    // when the writer task gets to run and drains them.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let event_log = match config.event_log.as_deref() {
        Some(path) => Some(rt.block_on(EventLog::open(path))?),
        None => None,
    };

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &config, event_log.as_ref());

    // Always try to restore terminal state.
    let _ = term.exit();

    if let Some(log) = event_log {
        rt.block_on(log.close());
    }
    if let Ok(balance) = &result {
        println!("Coins: {}", balance);
    }
    result.map(|_| ())
}

fn run(term: &mut TerminalRenderer, config: &RunnerConfig, event_log: Option<&EventLog>) -> Result<u64> {
    let mut game = GameState::with_options(config.game_options(), Wallet::default());
    game.start();

    let view = BeltView;
    let mut fb = FrameBuffer::new(0, 0);
    let mut selected: u32 = 0;

    let tick_duration = Duration::from_millis(TICK_MS as u64);
    let mut last_tick = Instant::now();

    loop {
        for event in game.drain_events() {
            if let Some(log) = event_log {
                log.record(&event);
            }
        }

        // Render.
        let snap = game.snapshot();
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        view.render_into(&snap, selected, Viewport::new(w, h), &mut fb);
        term.draw(&fb)?;

        // Input with timeout until next tick.
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match map_key(key) {
                        Some(UiAction::Quit) => {
                            if game.is_live() {
                                let _ = game.abort();
                            }
                            for event in game.drain_events() {
                                if let Some(log) = event_log {
                                    log.record(&event);
                                }
                            }
                            return Ok(game.economy().balance());
                        }
                        Some(action @ (UiAction::LaneUp | UiAction::LaneDown)) => {
                            selected = step_lane(selected, snap.lanes, action);
                        }
                        Some(UiAction::Drop(bin)) => {
                            if let Some(item) = snap.front_of_lane(selected) {
                                if let Err(error) = game.drop_item(item.ticket, bin) {
                                    debug!(%error, "drop ignored");
                                }
                            }
                        }
                        Some(UiAction::Continue) => {
                            if game.phase() == Phase::Graded && game.next_attempt().is_ok() {
                                selected = step_lane(selected, game.config().lanes, UiAction::Continue);
                            }
                        }
                        None => {}
                    }
                }
            }
        }

        // Tick.
        let elapsed = last_tick.elapsed();
        if elapsed >= tick_duration {
            let ms = elapsed.as_millis().min(u32::MAX as u128) as u32;
            last_tick += Duration::from_millis(ms as u64);
            game.advance(ms);
        }
    }
}
