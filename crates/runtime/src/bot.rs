//! Autoplay policy.
//!
//! Reads snapshots and picks at most one drop per call:
//!
//! - an unmatched required kind that would count goes to the order bin;
//! - a required kind that would not count (stale on a strict recipe, or a
//!   duplicate) is left to ride off, since trashing or stashing it costs points;
//! - with `stash_surplus`, other non-rotten items are stashed for the next
//!   attempt while the move budget has room to spare.

use std::collections::HashSet;

use conveyor_sorter_core::{Generation, ItemSnapshot, ItemTicket, LevelSnapshot};
use conveyor_sorter_types::{BinType, Freshness};

use crate::driver::{Command, Envelope};

#[derive(Debug, Clone, Default)]
pub struct Bot {
    stash_surplus: bool,
    generation: Option<Generation>,
    /// Tickets already acted on in the current attempt.
    sent: HashSet<ItemTicket>,
}

impl Bot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stashing_surplus() -> Self {
        Self {
            stash_surplus: true,
            ..Self::default()
        }
    }

    /// Next command, if any item deserves a move.
    pub fn decide(&mut self, snapshot: &LevelSnapshot) -> Option<Envelope> {
        if !snapshot.playable() {
            return None;
        }
        let generation = Generation(snapshot.generation);
        if self.generation != Some(generation) {
            self.generation = Some(generation);
            self.sent.clear();
        }

        let (item, bin) = snapshot
            .items
            .iter()
            .filter(|item| !self.sent.contains(&item.ticket))
            .filter_map(|item| self.choose_bin(snapshot, item).map(|bin| (item, bin)))
            .min_by_key(|(item, _)| item.remaining_ms)?;

        self.sent.insert(item.ticket);
        Some(Envelope::new(
            generation,
            Command::Drop {
                ticket: item.ticket,
                bin,
            },
        ))
    }

    pub fn choose_bin(&self, snapshot: &LevelSnapshot, item: &ItemSnapshot) -> Option<BinType> {
        if snapshot.required.contains(&item.kind) {
            let counts = !snapshot.strict_fresh_only || item.freshness == Freshness::Fresh;
            if counts && !snapshot.matched.contains(item.kind) {
                return Some(BinType::Order);
            }
            return None;
        }

        if self.stash_surplus && item.freshness != Freshness::Rotten {
            let still_needed = snapshot
                .required
                .iter()
                .filter(|kind| !snapshot.matched.contains(**kind))
                .count() as u32;
            if snapshot.moves_left > still_needed + 1 {
                return Some(BinType::Good);
            }
        }
        None
    }
}
