//! Headless autoplay: a bot plays `CONVEYOR_ATTEMPTS` attempts through the
//! async driver, then logs a summary.
//!
//! `CONVEYOR_SPEED` scales game time so a full run does not take minutes.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use conveyor_sorter::core::{Economy, GameEvent, GameState, Generation, GradeReport, Phase, Wallet};
use conveyor_sorter::runtime::{
    init_tracing, run_driver, Bot, Command, Envelope, EventLog, RunnerConfig, Update, COMMAND_QUEUE,
};

fn main() -> Result<()> {
    let config = RunnerConfig::from_env();
    init_tracing(&config.log_filter, config.log_file.as_deref())?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(play(config))
}

async fn play(config: RunnerConfig) -> Result<()> {
    let game = GameState::with_options(config.game_options(), Wallet::default());
    let event_log = match config.event_log.as_deref() {
        Some(path) => Some(EventLog::open(path).await?),
        None => None,
    };

    let (cmd_tx, cmd_rx) = mpsc::channel::<Envelope>(COMMAND_QUEUE);
    let (update_tx, mut update_rx) = mpsc::unbounded_channel::<Update>();
    let driver = tokio::spawn(run_driver(
        game,
        config.driver_options(),
        cmd_rx,
        update_tx,
        event_log,
    ));

    info!(
        seed = config.seed,
        attempts = config.attempts,
        speed = config.speed,
        "autoplay started"
    );

    let mut bot = Bot::stashing_surplus();
    let mut reports: Vec<GradeReport> = Vec::new();
    let mut advanced_from: Option<Generation> = None;

    while let Some(update) = update_rx.recv().await {
        match update {
            Update::Frame { events, snapshot } => {
                for event in &events {
                    if let GameEvent::Ended { report } = event {
                        info!(
                            level = report.level,
                            percent = report.percent(),
                            passed = report.passed(),
                            reason = report.reason.as_str(),
                            "attempt finished"
                        );
                        reports.push(*report);
                    }
                }

                let generation = Generation(snapshot.generation);
                if snapshot.phase == Phase::Graded {
                    if advanced_from == Some(generation) {
                        continue;
                    }
                    advanced_from = Some(generation);
                    let command = if reports.len() as u32 >= config.attempts {
                        Command::Shutdown
                    } else {
                        Command::NextAttempt
                    };
                    cmd_tx.send(Envelope::new(generation, command)).await?;
                } else if let Some(envelope) = bot.decide(&snapshot) {
                    cmd_tx.send(envelope).await?;
                }
            }
            Update::Stale { command, .. } => debug!(?command, "stale command"),
            Update::Rejected { command, error } => debug!(?command, %error, "command rejected"),
        }
    }

    let game = driver.await??;
    let passed = reports.iter().filter(|r| r.passed()).count();
    let mean = if reports.is_empty() {
        0.0
    } else {
        reports.iter().map(|r| r.percent() as f64).sum::<f64>() / reports.len() as f64
    };
    info!(
        attempts = reports.len(),
        passed,
        mean_percent = mean,
        final_level = game.level(),
        balance = game.economy().balance(),
        "autoplay finished"
    );
    Ok(())
}
