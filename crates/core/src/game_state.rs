//! Game state module - one level attempt from order preview to grade
//!
//! [`GameState`] owns the recipe, the stream, the tallies, and the two tick
//! sources of the current attempt. Time only moves through
//! [`GameState::advance`]; player input only through [`GameState::grab`],
//! [`GameState::release`], and [`GameState::drop_item`]. Each call runs to
//! completion, so a caller may interleave them in any order.
//!
//! ```text
//! Idle -> Preview -> Playing -> Grading -> Graded
//!            \__________/                   |
//!             drops accepted     next_attempt()
//! ```
//!
//! Within one instant the preview and countdown are settled before the stream,
//! so a time-up that coincides with the last emission reports `TimeUp`.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::LevelConfig;
use crate::economy::{Economy, Wallet};
use crate::error::LevelError;
use crate::grading::{self, GradePhase, GradeReport};
use crate::resolver::{classify, SortOutcome};
use crate::rng::SimpleRng;
use crate::scheduler::{Generation, Ticker};
use crate::session::{Applied, RematchPolicy, SessionState};
use crate::snapshot::{ItemSnapshot, LevelSnapshot};
use crate::spawner::{InFlight, ItemTicket, Spawner, StreamEvent};
use crate::types::{
    BinType, EndReason, Product, COUNTDOWN_TICK_MS, LEVEL_PASS_REWARD, ORDER_PREVIEW_MS,
};

/// Construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOptions {
    pub seed: u32,
    pub start_level: u32,
    pub rematch_policy: RematchPolicy,
    /// Order preview length; 0 starts the countdown immediately.
    pub preview_ms: u32,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            start_level: 1,
            rematch_policy: RematchPolicy::OncePerKind,
            preview_ms: ORDER_PREVIEW_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Built but not started.
    Idle,
    /// Order shown; items already flow, the countdown does not.
    Preview,
    Playing,
    Grading,
    Graded,
}

/// Notifications for observers, drained with [`GameState::drain_events`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    #[serde(rename_all = "camelCase")]
    AttemptStarted {
        generation: Generation,
        level: u32,
        order: &'static str,
        carry_over: u32,
    },
    PreviewEnded {
        generation: Generation,
    },
    Spawned {
        generation: Generation,
        item: InFlight,
    },
    Missed {
        generation: Generation,
        item: InFlight,
    },
    StreamExhausted {
        generation: Generation,
    },
    Sorted {
        generation: Generation,
        product: Product,
        bin: BinType,
        outcome: SortOutcome,
        applied: Applied,
    },
    Ended {
        report: GradeReport,
    },
}

/// Complete state of the current attempt.
#[derive(Debug, Clone)]
pub struct GameState<E: Economy = Wallet> {
    options: GameOptions,
    rng: SimpleRng,
    economy: E,
    generation: Generation,
    config: LevelConfig,
    phase: Phase,
    preview_left_ms: u32,
    session: SessionState,
    spawner: Spawner,
    countdown: Ticker,
    report: Option<GradeReport>,
    /// Carry-over of the last graded attempt, waiting for the next one.
    pending_carry_over: Vec<Product>,
    events: Vec<GameEvent>,
    stream_scratch: Vec<StreamEvent>,
}

impl<E: Economy> GameState<E> {
    /// Create a game at level 1 with the given RNG seed
    pub fn new(seed: u32, economy: E) -> Self {
        Self::with_options(
            GameOptions {
                seed,
                ..GameOptions::default()
            },
            economy,
        )
    }

    pub fn with_options(options: GameOptions, economy: E) -> Self {
        let mut rng = SimpleRng::new(options.seed);
        let config = LevelConfig::for_level(options.start_level, &mut rng);
        let generation = Generation::default();

        Self {
            options,
            rng,
            economy,
            generation,
            session: SessionState::new(&config, options.rematch_policy),
            spawner: Spawner::new(&config, generation, Vec::new()),
            config,
            phase: Phase::Idle,
            preview_left_ms: options.preview_ms,
            countdown: Ticker::stopped(COUNTDOWN_TICK_MS),
            report: None,
            pending_carry_over: Vec::new(),
            events: Vec::new(),
            stream_scratch: Vec::new(),
        }
    }

    /// Start the first attempt
    pub fn start(&mut self) {
        if self.phase != Phase::Idle {
            return;
        }
        self.begin_attempt(Vec::new());
    }

    /// Start the first attempt with a fixed configuration instead of a drawn one.
    pub fn start_with_config(&mut self, config: LevelConfig) {
        if self.phase != Phase::Idle {
            return;
        }
        self.config = config;
        self.session.reset(&config);
        self.begin_attempt(Vec::new());
    }

    fn begin_attempt(&mut self, carry_over: Vec<Product>) {
        let carried = carry_over.len() as u32;
        self.spawner = Spawner::new(&self.config, self.generation, carry_over);
        self.countdown = Ticker::stopped(COUNTDOWN_TICK_MS);
        self.preview_left_ms = self.options.preview_ms;
        self.report = None;

        if self.preview_left_ms == 0 {
            self.phase = Phase::Playing;
            self.countdown.restart();
        } else {
            self.phase = Phase::Preview;
        }

        info!(
            generation = self.generation.0,
            level = self.config.level,
            order = self.config.order.title,
            carry_over = carried,
            "attempt started"
        );
        self.events.push(GameEvent::AttemptStarted {
            generation: self.generation,
            level: self.config.level,
            order: self.config.order.title,
            carry_over: carried,
        });
    }

    pub fn options(&self) -> &GameOptions {
        &self.options
    }

    pub fn seed(&self) -> u32 {
        self.rng.seed()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn level(&self) -> u32 {
        self.config.level
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn grade_phase(&self) -> GradePhase {
        match self.phase {
            Phase::Grading => GradePhase::Grading,
            Phase::Graded => GradePhase::Graded,
            _ => GradePhase::InProgress,
        }
    }

    /// Whether drops are currently accepted.
    pub fn is_live(&self) -> bool {
        matches!(self.phase, Phase::Preview | Phase::Playing)
    }

    pub fn preview_left_ms(&self) -> u32 {
        self.preview_left_ms
    }

    pub fn time_left_ms(&self) -> u32 {
        self.session.time_left_ms()
    }

    pub fn moves_left(&self) -> u32 {
        self.session.moves_left()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub fn report(&self) -> Option<&GradeReport> {
        self.report.as_ref()
    }

    pub fn pending_carry_over(&self) -> &[Product] {
        &self.pending_carry_over
    }

    pub fn economy(&self) -> &E {
        &self.economy
    }

    pub fn economy_mut(&mut self) -> &mut E {
        &mut self.economy
    }

    /// Milliseconds until something is due, or `None` if nothing is scheduled.
    pub fn until_next_event(&self) -> Option<u32> {
        let preview = match self.phase {
            Phase::Preview => Some(self.preview_left_ms),
            Phase::Playing => None,
            _ => return None,
        };
        [preview, self.countdown.until_next(), self.spawner.until_next_event()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Advance the clock by `elapsed_ms`.
    ///
    /// Returns `true` if the attempt ended during this call.
    pub fn advance(&mut self, elapsed_ms: u32) -> bool {
        let mut left = elapsed_ms;
        while left > 0 && self.is_live() {
            let step = self.until_next_event().map_or(left, |due| due.min(left));
            left -= step;
            if self.step(step) {
                return true;
            }
        }
        false
    }

    fn step(&mut self, dt: u32) -> bool {
        match self.phase {
            Phase::Preview => {
                self.preview_left_ms = self.preview_left_ms.saturating_sub(dt);
                if self.preview_left_ms == 0 {
                    self.phase = Phase::Playing;
                    self.countdown.restart();
                    self.events.push(GameEvent::PreviewEnded {
                        generation: self.generation,
                    });
                }
            }
            Phase::Playing => {
                self.session.add_elapsed(dt);
                if self.countdown.advance(dt) > 0 && self.session.refresh_countdown() {
                    // Nothing else happens at the instant time runs out.
                    self.end_on_trigger(EndReason::TimeUp);
                    return true;
                }
            }
            _ => return false,
        }

        let mut stream = std::mem::take(&mut self.stream_scratch);
        self.spawner.advance(dt, &mut self.rng, &mut stream);
        let mut exhausted = false;
        for event in stream.drain(..) {
            let generation = self.generation;
            match event {
                StreamEvent::Spawned(item) => {
                    self.events.push(GameEvent::Spawned { generation, item })
                }
                StreamEvent::Missed(item) => {
                    debug!(id = %item.product.id, kind = %item.product.kind, "item missed");
                    self.events.push(GameEvent::Missed { generation, item })
                }
                StreamEvent::Exhausted => {
                    exhausted = true;
                    self.events.push(GameEvent::StreamExhausted { generation });
                }
            }
        }
        self.stream_scratch = stream;

        if exhausted {
            info!(
                generation = self.generation.0,
                emitted = self.spawner.emitted(),
                "stream exhausted"
            );
            self.end_on_trigger(EndReason::FinishedStream);
            return true;
        }
        false
    }

    fn ensure_live(&self) -> Result<(), LevelError> {
        match self.phase {
            Phase::Preview | Phase::Playing => Ok(()),
            Phase::Grading | Phase::Graded => Err(self.already_graded()),
            Phase::Idle => Err(LevelError::NotPlaying),
        }
    }

    fn already_graded(&self) -> LevelError {
        LevelError::AlreadyGraded {
            level: self.config.level,
            generation: self.generation.0,
        }
    }

    /// Lift an item off its lane. Travel pauses while it is held.
    pub fn grab(&mut self, ticket: ItemTicket) -> Result<InFlight, LevelError> {
        self.ensure_live()?;
        if ticket.generation != self.generation {
            return Err(LevelError::StaleTicket {
                ticket,
                current: self.generation,
            });
        }
        if self.spawner.held().is_some() {
            return Err(LevelError::HandsFull);
        }
        self.spawner
            .grab(ticket)
            .copied()
            .ok_or(LevelError::NotInFlight(ticket.id))
    }

    /// Let go of the held item: over a bin it is resolved, otherwise it goes
    /// back on its lane.
    pub fn release(&mut self, bin: Option<BinType>) -> Result<Option<SortOutcome>, LevelError> {
        self.ensure_live()?;
        let Some(bin) = bin else {
            return if self.spawner.return_held() {
                Ok(None)
            } else {
                Err(LevelError::NothingHeld)
            };
        };
        let item = self.spawner.take_held().ok_or(LevelError::NothingHeld)?;
        Ok(Some(self.resolve(item, bin)))
    }

    /// Grab and drop in one step.
    pub fn drop_item(&mut self, ticket: ItemTicket, bin: BinType) -> Result<SortOutcome, LevelError> {
        self.grab(ticket)?;
        let item = self.spawner.take_held().ok_or(LevelError::NothingHeld)?;
        Ok(self.resolve(item, bin))
    }

    fn resolve(&mut self, item: InFlight, bin: BinType) -> SortOutcome {
        let outcome = classify(&item.product, bin, &self.config.order);
        let applied = self.session.apply(&outcome);
        debug!(
            id = %item.product.id,
            kind = %item.product.kind,
            bin = bin.as_str(),
            ?applied,
            "item sorted"
        );
        self.events.push(GameEvent::Sorted {
            generation: self.generation,
            product: item.product,
            bin,
            outcome,
            applied,
        });

        // The drop counts before the budget is checked.
        if self.session.use_move() {
            self.end_on_trigger(EndReason::OutOfMoves);
        }
        outcome
    }

    /// End triggered from inside the attempt, which is live by construction.
    fn end_on_trigger(&mut self, reason: EndReason) {
        let result = self.end(reason);
        debug_assert!(result.is_ok(), "internal end refused: {result:?}");
        if let Err(e) = result {
            warn!(reason = reason.as_str(), error = %e, "internal end refused");
        }
    }

    /// Manual exit. Graded like any other ending but not surfaced.
    pub fn abort(&mut self) -> Result<GradeReport, LevelError> {
        self.end(EndReason::Aborted)
    }

    /// End the attempt and grade it. Runs once per attempt.
    pub fn end(&mut self, reason: EndReason) -> Result<GradeReport, LevelError> {
        self.ensure_live()?;
        self.phase = Phase::Grading;
        self.spawner.stop();
        self.countdown.stop();

        let grade = grading::grade(&self.session.grade_input(self.config.order.required_set()));
        self.session.record_missed_required(grade.missed_required);

        let reward = if grade.passed {
            self.economy.credit(LEVEL_PASS_REWARD);
            LEVEL_PASS_REWARD
        } else {
            0
        };

        self.pending_carry_over = self.session.take_carry_over();
        let report = GradeReport {
            level: self.config.level,
            generation: self.generation.0,
            reason,
            grade,
            surfaced: reason.surfaces_result(),
            reward,
            carry_over: self.pending_carry_over.len() as u32,
        };

        info!(
            generation = self.generation.0,
            level = report.level,
            reason = reason.as_str(),
            percent = grade.percent,
            passed = grade.passed,
            reward,
            "attempt graded"
        );

        self.report = Some(report);
        self.phase = Phase::Graded;
        self.events.push(GameEvent::Ended { report });
        Ok(report)
    }

    /// Start the next attempt: the next level after a pass, the same level
    /// after a fail. Carry-over from the graded attempt is fed in first.
    pub fn next_attempt(&mut self) -> Result<(), LevelError> {
        let Some(report) = self.report.filter(|_| self.phase == Phase::Graded) else {
            return Err(LevelError::NotGraded);
        };

        let level = if report.passed() {
            self.config.level.saturating_add(1)
        } else {
            self.config.level
        };
        self.generation = self.generation.next();
        self.config = LevelConfig::for_level(level, &mut self.rng);
        self.session.reset(&self.config);
        let carry_over = std::mem::take(&mut self.pending_carry_over);
        self.begin_attempt(carry_over);
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        let order = &self.config.order;
        LevelSnapshot {
            generation: self.generation.0,
            level: self.config.level,
            phase: self.phase,
            lanes: self.config.lanes,
            order_title: order.title,
            order_description: order.description,
            required: order.required,
            strict_fresh_only: order.strict_fresh_only,
            preview_left_ms: self.preview_left_ms,
            time_left_ms: self.session.time_left_ms(),
            moves_left: self.session.moves_left(),
            matched: self.session.matched_kinds(),
            wrong_in_order: self.session.wrong_in_order(),
            emitted: self.spawner.emitted(),
            max_stream: self.spawner.max_stream(),
            stashed: self.session.carry_over().len() as u32,
            items: self.spawner.belt().iter().map(ItemSnapshot::from).collect(),
            held: self.spawner.held().map(ItemSnapshot::from),
            report: self.report,
            balance: self.economy.balance(),
        }
    }
}
