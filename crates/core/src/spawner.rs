//! Spawner module - the bounded item stream for one attempt
//!
//! The spawner owns every product between emission and resolution:
//!
//! - Carry-over items from the previous attempt are emitted first, FIFO, with
//!   the freshness they were stashed at.
//! - Fresh items are biased toward the active recipe: the kind is drawn from a
//!   four-slot pool holding three draws from the required set and one from the
//!   full universe; required kinds are fresh two times out of three, others are
//!   uniform over all freshness levels.
//! - Each item rides a uniformly random lane for `travel_ms`. If nobody grabs
//!   it first it is reported as [`StreamEvent::Missed`]. Missing has no direct
//!   scoring effect.
//! - After `max_stream` emissions the next tick reports
//!   [`StreamEvent::Exhausted`], once.
//! - [`Spawner::stop`] cancels the ticker and discards everything in flight.

use std::collections::VecDeque;

use arrayvec::ArrayVec;
use serde::Serialize;
use tracing::debug;

use crate::catalog::{LevelConfig, OrderSpec};
use crate::rng::SimpleRng;
use crate::scheduler::{Generation, Ticker};
use crate::types::{Freshness, Product, ProductId, ProductKind, RETURN_TO_BELT_MIN_MS};

/// Handle given to the player for an item in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ItemTicket {
    pub generation: Generation,
    pub id: ProductId,
}

/// An item riding (or lifted off) a lane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InFlight {
    pub ticket: ItemTicket,
    pub product: Product,
    pub lane: u32,
    pub travel_ms: u32,
    pub remaining_ms: u32,
}

impl InFlight {
    /// Fraction of the lane covered, 0.0 at the start and 1.0 at the end.
    pub fn progress(&self) -> f32 {
        if self.travel_ms == 0 {
            return 1.0;
        }
        let done = self.travel_ms.saturating_sub(self.remaining_ms);
        (done as f32 / self.travel_ms as f32).clamp(0.0, 1.0)
    }
}

/// Stream notifications, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StreamEvent {
    Spawned(InFlight),
    Missed(InFlight),
    Exhausted,
}

/// Required kinds spawn fresh twice as often as acceptable, never rotten.
const REQUIRED_FRESHNESS: [Freshness; 3] =
    [Freshness::Fresh, Freshness::Fresh, Freshness::Acceptable];

#[derive(Debug, Clone)]
pub struct Spawner {
    generation: Generation,
    order: OrderSpec,
    lanes: u32,
    travel_ms: u32,
    max_stream: u32,
    carry_over: VecDeque<Product>,
    emitted: u32,
    next_serial: u32,
    ticker: Ticker,
    exhausted: bool,
    stopped: bool,
    /// Items on the belts, in emission order.
    belt: Vec<InFlight>,
    held: Option<InFlight>,
}

impl Spawner {
    pub fn new(config: &LevelConfig, generation: Generation, carry_over: Vec<Product>) -> Self {
        let max_stream = config.max_stream();
        let mut carry_over: VecDeque<Product> = carry_over.into();
        if carry_over.len() > max_stream as usize {
            let dropped = carry_over.len() - max_stream as usize;
            carry_over.truncate(max_stream as usize);
            debug!(dropped, max_stream, "carry-over exceeds stream cap");
        }

        Self {
            generation,
            order: config.order,
            lanes: config.lanes.max(1),
            travel_ms: config.travel_ms(),
            max_stream,
            carry_over,
            emitted: 0,
            next_serial: 0,
            ticker: Ticker::new(config.spawn_interval_ms),
            exhausted: false,
            stopped: false,
            belt: Vec::new(),
            held: None,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    pub fn max_stream(&self) -> u32 {
        self.max_stream
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn carry_over_pending(&self) -> usize {
        self.carry_over.len()
    }

    pub fn belt(&self) -> &[InFlight] {
        &self.belt
    }

    pub fn held(&self) -> Option<&InFlight> {
        self.held.as_ref()
    }

    /// Item closest to the end of `lane`.
    pub fn front_of_lane(&self, lane: u32) -> Option<&InFlight> {
        self.belt
            .iter()
            .filter(|item| item.lane == lane)
            .min_by_key(|item| item.remaining_ms)
    }

    /// Milliseconds until the next emission tick or item arrival.
    pub fn until_next_event(&self) -> Option<u32> {
        if self.stopped {
            return None;
        }
        let arrival = self.belt.iter().map(|item| item.remaining_ms).min();
        match (self.ticker.until_next(), arrival) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Move the stream forward by `elapsed_ms`, appending notifications to `out`.
    ///
    /// The step is split at every arrival and emission inside it, so one long
    /// step reports the same events as many short ones. Arrivals are reported
    /// before emissions that fall on the same instant.
    pub fn advance(&mut self, elapsed_ms: u32, rng: &mut SimpleRng, out: &mut Vec<StreamEvent>) {
        let mut left = elapsed_ms;
        while left > 0 && !self.stopped {
            let step = self
                .until_next_event()
                .map_or(left, |due| due.clamp(1, left));
            left -= step;
            self.step(step, rng, out);
        }
    }

    /// Advance by at most the time to the next due point.
    fn step(&mut self, dt: u32, rng: &mut SimpleRng, out: &mut Vec<StreamEvent>) {
        for item in self.belt.iter_mut() {
            item.remaining_ms = item.remaining_ms.saturating_sub(dt);
        }
        let mut i = 0;
        while i < self.belt.len() {
            if self.belt[i].remaining_ms == 0 {
                let missed = self.belt.remove(i);
                out.push(StreamEvent::Missed(missed));
            } else {
                i += 1;
            }
        }

        if self.ticker.advance(dt) > 0 {
            self.fire(rng, out);
        }
    }

    fn fire(&mut self, rng: &mut SimpleRng, out: &mut Vec<StreamEvent>) {
        if self.emitted >= self.max_stream {
            self.ticker.stop();
            if !self.exhausted {
                self.exhausted = true;
                out.push(StreamEvent::Exhausted);
            }
            return;
        }

        self.emitted += 1;
        let product = match self.carry_over.pop_front() {
            Some(carried) => carried,
            None => self.generate(rng),
        };
        let lane = rng.next_range(self.lanes);
        let item = InFlight {
            ticket: ItemTicket {
                generation: self.generation,
                id: product.id,
            },
            product,
            lane,
            travel_ms: self.travel_ms,
            remaining_ms: self.travel_ms,
        };
        self.belt.push(item);
        out.push(StreamEvent::Spawned(item));
    }

    fn generate(&mut self, rng: &mut SimpleRng) -> Product {
        let mut pool: ArrayVec<ProductKind, 4> = ArrayVec::new();
        for _ in 0..3 {
            let kind = match rng.pick(self.order.required) {
                Some(kind) => *kind,
                None => universe_kind(rng),
            };
            pool.push(kind);
        }
        pool.push(universe_kind(rng));
        let kind = rng.pick(pool.as_slice()).copied().unwrap_or(pool[0]);

        let freshness = if self.order.requires(kind) {
            rng.pick(&REQUIRED_FRESHNESS).copied()
        } else {
            rng.pick(&Freshness::ALL).copied()
        }
        .unwrap_or(Freshness::Fresh);

        let id = ProductId::new(self.generation.0, self.next_serial);
        self.next_serial = self.next_serial.wrapping_add(1);
        Product::new(id, kind, freshness)
    }

    /// Lift an item off the belt. Its travel pauses while held.
    ///
    /// Returns `None` if something is already held or the ticket does not
    /// name an item on the belt.
    pub fn grab(&mut self, ticket: ItemTicket) -> Option<&InFlight> {
        if self.stopped || self.held.is_some() || ticket.generation != self.generation {
            return None;
        }
        let i = self.belt.iter().position(|item| item.ticket == ticket)?;
        self.held = Some(self.belt.remove(i));
        self.held.as_ref()
    }

    /// Hand the held item over for resolution.
    pub fn take_held(&mut self) -> Option<InFlight> {
        self.held.take()
    }

    /// Put the held item back on its lane with the travel it had left.
    pub fn return_held(&mut self) -> bool {
        match self.held.take() {
            Some(mut item) => {
                item.remaining_ms = item.remaining_ms.max(RETURN_TO_BELT_MIN_MS);
                self.belt.push(item);
                true
            }
            None => false,
        }
    }

    /// Cancel the ticker and discard everything in flight. No further events.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.ticker.stop();
        self.belt.clear();
        self.held = None;
    }
}

fn universe_kind(rng: &mut SimpleRng) -> ProductKind {
    rng.pick(&ProductKind::ALL)
        .copied()
        .unwrap_or(ProductKind::Tomato)
}
