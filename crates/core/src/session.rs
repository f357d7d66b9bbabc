//! Session state - the mutable tallies of one attempt
//!
//! Created at attempt start, mutated by drops and the countdown, read once by
//! grading. Every mutation runs to completion inside a single call, so timer
//! callbacks and input events can interleave freely without tearing counters.

use serde::Serialize;

use crate::catalog::LevelConfig;
use crate::grading::GradeInput;
use crate::resolver::SortOutcome;
use crate::types::{KindSet, Product};

/// How repeated submissions of an already matched kind are credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RematchPolicy {
    /// One freshness weight per required kind; later copies earn nothing and
    /// cost nothing.
    #[default]
    OncePerKind,
    /// Every successful submission appends a weight, even for a kind already
    /// matched.
    EveryDrop,
}

impl RematchPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "once" | "onceperkind" => Some(RematchPolicy::OncePerKind),
            "every" | "everydrop" => Some(RematchPolicy::EveryDrop),
            _ => None,
        }
    }
}

/// What [`SessionState::apply`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Applied {
    Matched,
    /// Kind was already matched and the policy grants one weight per kind.
    AlreadyMatched,
    Wrong,
    CarriedOver,
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    time_limit_ms: u32,
    elapsed_ms: u32,
    time_left_ms: u32,
    moves_left: u32,
    matched_kinds: KindSet,
    matched_weights: Vec<f64>,
    wrong_in_order: u32,
    /// Filled in by grading only.
    missed_required: u32,
    carry_over: Vec<Product>,
    policy: RematchPolicy,
}

impl SessionState {
    pub fn new(config: &LevelConfig, policy: RematchPolicy) -> Self {
        Self {
            time_limit_ms: config.time_limit_ms,
            elapsed_ms: 0,
            time_left_ms: config.time_limit_ms,
            moves_left: config.move_limit,
            matched_kinds: KindSet::EMPTY,
            matched_weights: Vec::new(),
            wrong_in_order: 0,
            missed_required: 0,
            carry_over: Vec::new(),
            policy,
        }
    }

    /// Clear everything for a fresh attempt. Carry-over is not kept; take it first.
    pub fn reset(&mut self, config: &LevelConfig) {
        *self = Self::new(config, self.policy);
    }

    pub fn time_limit_ms(&self) -> u32 {
        self.time_limit_ms
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    pub fn time_left_ms(&self) -> u32 {
        self.time_left_ms
    }

    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }

    pub fn matched_kinds(&self) -> KindSet {
        self.matched_kinds
    }

    pub fn matched_weights(&self) -> &[f64] {
        &self.matched_weights
    }

    pub fn wrong_in_order(&self) -> u32 {
        self.wrong_in_order
    }

    pub fn missed_required(&self) -> u32 {
        self.missed_required
    }

    pub fn carry_over(&self) -> &[Product] {
        &self.carry_over
    }

    pub fn policy(&self) -> RematchPolicy {
        self.policy
    }

    /// Add countdown time. Only the countdown ticker refreshes `time_left_ms`.
    pub fn add_elapsed(&mut self, elapsed_ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
    }

    /// Recompute the remaining time; returns `true` once time has run out.
    pub fn refresh_countdown(&mut self) -> bool {
        self.time_left_ms = self.time_limit_ms.saturating_sub(self.elapsed_ms);
        self.time_left_ms == 0
    }

    /// Spend one move; returns `true` when the budget is exhausted.
    pub fn use_move(&mut self) -> bool {
        self.moves_left = self.moves_left.saturating_sub(1);
        self.moves_left == 0
    }

    /// Apply a classified drop.
    pub fn apply(&mut self, outcome: &SortOutcome) -> Applied {
        match *outcome {
            SortOutcome::Matched { kind, weight } => {
                let first = self.matched_kinds.insert(kind);
                if first || self.policy == RematchPolicy::EveryDrop {
                    self.matched_weights.push(weight);
                    Applied::Matched
                } else {
                    Applied::AlreadyMatched
                }
            }
            SortOutcome::WrongInOrder { .. } => {
                self.wrong_in_order += 1;
                Applied::Wrong
            }
            SortOutcome::CarriedOver { product } => {
                self.carry_over.push(product);
                Applied::CarriedOver
            }
            SortOutcome::Discarded => Applied::Discarded,
        }
    }

    /// Inputs for the grading computation.
    pub fn grade_input(&self, required: KindSet) -> GradeInput<'_> {
        GradeInput {
            required,
            matched: self.matched_kinds,
            weights: &self.matched_weights,
            wrong_in_order: self.wrong_in_order,
        }
    }

    pub(crate) fn record_missed_required(&mut self, missed: u32) {
        self.missed_required = missed;
    }

    /// Hand the carry-over batch to the next attempt, oldest first.
    pub fn take_carry_over(&mut self) -> Vec<Product> {
        std::mem::take(&mut self.carry_over)
    }
}
