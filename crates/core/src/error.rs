use thiserror::Error;

use crate::scheduler::Generation;
use crate::spawner::ItemTicket;
use crate::types::ProductId;

/// Rejected attempt operations. Returning one of these never changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("attempt {generation} of level {level} has already been graded")]
    AlreadyGraded { level: u32, generation: u32 },

    #[error("ticket from attempt {} does not belong to attempt {}", ticket.generation.0, current.0)]
    StaleTicket {
        ticket: ItemTicket,
        current: Generation,
    },

    #[error("item {0} is not in flight")]
    NotInFlight(ProductId),

    #[error("an item is already held")]
    HandsFull,

    #[error("no item is held")]
    NothingHeld,

    #[error("attempt is not being played")]
    NotPlaying,

    #[error("attempt has not been graded yet")]
    NotGraded,
}
