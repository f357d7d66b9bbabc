//! Core gameplay module - pure, deterministic, and testable
//!
//! Everything a level attempt needs, with no dependency on terminals, async
//! runtimes, or files. The same seed and the same call sequence always produce
//! the same attempt.
//!
//! # Module Structure
//!
//! - [`catalog`]: recipes and the per-level configuration formulas
//! - [`spawner`]: bounded, order-biased item stream with lanes and travel
//! - [`resolver`]: decision table for dropping an item into a bin
//! - [`session`]: tallies of one attempt
//! - [`grading`]: final percentage and pass/fail
//! - [`scheduler`]: tick sources and attempt generations
//! - [`economy`]: currency seam credited on a pass
//! - [`game_state`]: the attempt state machine tying the above together
//!
//! # Example
//!
//! ```
//! use conveyor_sorter_core::{GameEvent, GameState, Wallet};
//! use conveyor_sorter_types::BinType;
//!
//! let mut game = GameState::new(12345, Wallet::default());
//! game.start();
//!
//! // Let the first item arrive on the belt.
//! let interval = game.config().spawn_interval_ms;
//! game.advance(interval);
//!
//! let ticket = game
//!     .drain_events()
//!     .into_iter()
//!     .find_map(|e| match e {
//!         GameEvent::Spawned { item, .. } => Some(item.ticket),
//!         _ => None,
//!     })
//!     .unwrap();
//! game.drop_item(ticket, BinType::Order).unwrap();
//! assert_eq!(game.moves_left(), game.config().move_limit - 1);
//! ```
//!
//! # Timing
//!
//! Time is virtual and measured in milliseconds. Call
//! [`GameState::advance`](game_state::GameState::advance) with the elapsed
//! time; it steps from one due point to the next (item arrival, countdown
//! tick, emission), so one large step and many small ones give the same result.

pub mod catalog;
pub mod economy;
pub mod error;
pub mod game_state;
pub mod grading;
pub mod resolver;
pub mod rng;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod spawner;

pub use conveyor_sorter_types as types;

pub use catalog::{LevelConfig, OrderSpec, ORDER_CATALOG};
pub use economy::{Economy, Reward, Wallet};
pub use error::LevelError;
pub use game_state::{GameEvent, GameOptions, GameState, Phase};
pub use grading::{grade, Grade, GradeInput, GradePhase, GradeReport};
pub use resolver::{classify, SortOutcome, WrongReason};
pub use rng::SimpleRng;
pub use scheduler::{Generation, Ticker};
pub use session::{Applied, RematchPolicy, SessionState};
pub use snapshot::{ItemSnapshot, LevelSnapshot};
pub use spawner::{InFlight, ItemTicket, Spawner, StreamEvent};
