//! Async driver and event log tests
//!
//! Driver tests run on a paused clock: tokio jumps straight to the next frame
//! whenever every task is idle, so a whole attempt takes no real time.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_test::assert_ok;

use conveyor_sorter::core::{
    GameEvent, GameOptions, GameState, Generation, InFlight, LevelError, LevelSnapshot, Phase,
    Wallet,
};
use conveyor_sorter::runtime::{
    run_driver, Command, DriverOptions, Envelope, EventLog, Update, COMMAND_QUEUE,
};
use conveyor_sorter::types::{BinType, EndReason};

struct Harness {
    cmd_tx: mpsc::Sender<Envelope>,
    update_rx: mpsc::UnboundedReceiver<Update>,
    driver: JoinHandle<Result<GameState>>,
}

impl Harness {
    fn spawn(seed: u32, speed: u32) -> Self {
        let game = GameState::with_options(
            GameOptions {
                seed,
                preview_ms: 0,
                ..GameOptions::default()
            },
            Wallet::default(),
        );
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let options = DriverOptions {
            speed,
            ..DriverOptions::default()
        };
        let driver = tokio::spawn(run_driver(game, options, cmd_rx, update_tx, None));
        Self {
            cmd_tx,
            update_rx,
            driver,
        }
    }

    async fn send(&self, generation: u32, command: Command) {
        assert_ok!(
            self.cmd_tx
                .send(Envelope::new(Generation(generation), command))
                .await
        );
    }

    /// Wait for the first frame whose events satisfy `pred`.
    async fn frame_with(
        &mut self,
        pred: impl Fn(&GameEvent) -> bool,
    ) -> (Vec<GameEvent>, LevelSnapshot) {
        loop {
            match self.update_rx.recv().await {
                Some(Update::Frame { events, snapshot }) if events.iter().any(&pred) => {
                    return (events, snapshot)
                }
                Some(_) => {}
                None => panic!("driver stopped"),
            }
        }
    }

    async fn next_spawn(&mut self) -> InFlight {
        let (events, _) = self
            .frame_with(|e| matches!(e, GameEvent::Spawned { .. }))
            .await;
        events
            .into_iter()
            .find_map(|e| match e {
                GameEvent::Spawned { item, .. } => Some(item),
                _ => None,
            })
            .unwrap()
    }

    /// Next update that is not a frame.
    async fn next_notice(&mut self) -> Update {
        loop {
            match self.update_rx.recv().await {
                Some(Update::Frame { .. }) => {}
                Some(update) => return update,
                None => panic!("driver stopped"),
            }
        }
    }

    async fn shutdown(self) -> GameState {
        // Shutdown is honoured whatever its generation.
        self.send(0, Command::Shutdown).await;
        let Self { driver, .. } = self;
        assert_ok!(assert_ok!(driver.await))
    }
}

#[tokio::test(start_paused = true)]
async fn test_first_frame_shows_started_attempt() {
    let mut h = Harness::spawn(3, 1);
    let (_, snapshot) = h
        .frame_with(|e| matches!(e, GameEvent::AttemptStarted { .. }))
        .await;
    assert_eq!(snapshot.phase, Phase::Playing);
    assert_eq!(snapshot.generation, 0);
    assert_eq!(snapshot.emitted, 0);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_drop_command_is_applied() {
    let mut h = Harness::spawn(5, 1);
    let item = h.next_spawn().await;

    h.send(
        0,
        Command::Drop {
            ticket: item.ticket,
            bin: BinType::Trash,
        },
    )
    .await;
    let (events, snapshot) = h
        .frame_with(|e| matches!(e, GameEvent::Sorted { .. }))
        .await;
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::Sorted { product, bin: BinType::Trash, .. } if product.id == item.product.id
    )));
    assert!(snapshot.items.iter().all(|i| i.ticket != item.ticket));

    let game = h.shutdown().await;
    assert_eq!(game.moves_left(), game.config().move_limit - 1);
    let report = game.report().copied().unwrap();
    assert_eq!(report.reason, EndReason::Aborted);
    assert!(!report.surfaced);
}

#[tokio::test(start_paused = true)]
async fn test_refused_command_is_reported() {
    let mut h = Harness::spawn(5, 1);
    h.send(0, Command::Release(None)).await;
    match h.next_notice().await {
        Update::Rejected { command, error } => {
            assert_eq!(command, Command::Release(None));
            assert_eq!(error, LevelError::NothingHeld);
        }
        other => panic!("unexpected update: {other:?}"),
    }
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_commands_for_old_attempt_are_dropped() {
    let mut h = Harness::spawn(9, 1);
    let item = h.next_spawn().await;

    h.send(0, Command::Abort).await;
    h.frame_with(|e| matches!(e, GameEvent::Ended { .. })).await;
    h.send(0, Command::NextAttempt).await;
    h.frame_with(|e| matches!(e, GameEvent::AttemptStarted { .. }))
        .await;

    let queued_late = Command::Drop {
        ticket: item.ticket,
        bin: BinType::Order,
    };
    h.send(0, queued_late).await;
    match h.next_notice().await {
        Update::Stale {
            command,
            sent,
            current,
        } => {
            assert_eq!(command, queued_late);
            assert_eq!(sent, Generation(0));
            assert_eq!(current, Generation(1));
        }
        other => panic!("unexpected update: {other:?}"),
    }

    let game = h.shutdown().await;
    assert_eq!(game.generation(), Generation(1));
    assert_eq!(game.session().wrong_in_order(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_speed_scales_game_time() {
    let started = tokio::time::Instant::now();
    let mut h = Harness::spawn(2, 50);
    let (events, snapshot) = h
        .frame_with(|e| matches!(e, GameEvent::Ended { .. }))
        .await;

    // A level 1 stream lasts about half a minute of game time.
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(snapshot.phase, Phase::Graded);
    let report = events
        .iter()
        .find_map(|e| match e {
            GameEvent::Ended { report } => Some(*report),
            _ => None,
        })
        .unwrap();
    assert!(report.surfaced);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_driver_stops_when_senders_drop() {
    let Harness {
        cmd_tx,
        mut update_rx,
        driver,
    } = Harness::spawn(1, 1);
    assert!(update_rx.recv().await.is_some());
    drop(cmd_tx);

    let game = assert_ok!(assert_ok!(driver.await));
    // Closing the channel is not an abort.
    assert!(game.is_live());
    assert!(game.report().is_none());
}

#[tokio::test]
async fn test_event_log_writes_one_json_object_per_line() {
    let path = std::env::temp_dir().join(format!("conveyor-events-{}.jsonl", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let mut game = GameState::with_options(
        GameOptions {
            seed: 6,
            preview_ms: 1000,
            ..GameOptions::default()
        },
        Wallet::default(),
    );
    game.start();
    game.advance(1000);
    game.abort().unwrap();
    let events = game.drain_events();

    let log = assert_ok!(EventLog::open(&path).await);
    for event in &events {
        log.record(event);
    }
    log.close().await;

    let text = assert_ok!(std::fs::read_to_string(&path));
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), events.len());
    assert_eq!(lines[0]["type"], "attemptStarted");
    assert_eq!(lines[0]["carryOver"], 0);
    assert!(lines.iter().any(|l| l["type"] == "previewEnded"));
    let last = lines.last().unwrap();
    assert_eq!(last["type"], "ended");
    assert_eq!(last["report"]["reason"], "aborted");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_event_log_recorded_from_sync_code_is_written_on_close() {
    let path = std::env::temp_dir().join(format!("conveyor-sync-{}.jsonl", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let rt = assert_ok!(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build());
    let log = assert_ok!(rt.block_on(EventLog::open(&path)));

    let mut game = GameState::with_options(
        GameOptions {
            seed: 11,
            preview_ms: 0,
            ..GameOptions::default()
        },
        Wallet::default(),
    );
    game.start();
    game.advance(game.config().spawn_interval_ms * 3);
    game.abort().unwrap();
    let events = game.drain_events();
    // Recorded outside the runtime, as the terminal game loop does.
    for event in &events {
        log.record(event);
    }
    rt.block_on(log.close());

    let text = assert_ok!(std::fs::read_to_string(&path));
    assert_eq!(text.lines().count(), events.len());
    assert!(text.lines().last().unwrap().contains("\"type\":\"ended\""));

    let _ = std::fs::remove_file(&path);
}
