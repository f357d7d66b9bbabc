//! Grading module - final percentage for an attempt
//!
//! ```text
//! missed   = |required - matched|
//! ratio    = |matched| / |required|            (1.0 when nothing is required)
//! fresh    = mean(weights)                      (1.0 when nothing matched)
//! raw      = ratio * 100 * fresh - missed * 25 - wrong * 10
//! percent  = clamp(round(raw), 0, 100)
//! passed   = percent >= 70
//! ```
//!
//! The computation is a pure function of its inputs; the attempt state
//! machine around it lives in [`crate::game_state`].

use serde::Serialize;

use crate::types::{
    EndReason, KindSet, MISSED_REQUIRED_PENALTY, PASS_THRESHOLD_PERCENT, WRONG_IN_ORDER_PENALTY,
};

/// Everything grading reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeInput<'a> {
    pub required: KindSet,
    pub matched: KindSet,
    pub weights: &'a [f64],
    pub wrong_in_order: u32,
}

/// Grade breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub missed_required: u32,
    pub base_ratio: f64,
    pub avg_fresh_mult: f64,
    pub raw_percent: f64,
    pub percent: u8,
    pub passed: bool,
}

/// Grade an attempt.
pub fn grade(input: &GradeInput<'_>) -> Grade {
    let missed_required = input.required.difference(&input.matched).len() as u32;

    // Only required kinds can be matched, but keep the ratio honest anyway.
    let matched_required = input.matched.intersection(&input.required).len();
    let base_ratio = if input.required.is_empty() {
        1.0
    } else {
        matched_required as f64 / input.required.len() as f64
    };

    let avg_fresh_mult = if input.weights.is_empty() {
        1.0
    } else {
        input.weights.iter().sum::<f64>() / input.weights.len() as f64
    };

    let raw_percent = base_ratio * 100.0 * avg_fresh_mult
        - missed_required as f64 * MISSED_REQUIRED_PENALTY
        - input.wrong_in_order as f64 * WRONG_IN_ORDER_PENALTY;

    let percent = raw_percent.round().clamp(0.0, 100.0) as u8;

    Grade {
        missed_required,
        base_ratio,
        avg_fresh_mult,
        raw_percent,
        percent,
        passed: percent >= PASS_THRESHOLD_PERCENT,
    }
}

/// Grading lifecycle of one attempt. Re-entry to `InProgress` only happens
/// through an explicit next-attempt reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GradePhase {
    InProgress,
    Grading,
    Graded,
}

/// Result of a finished attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub level: u32,
    pub generation: u32,
    pub reason: EndReason,
    pub grade: Grade,
    /// Whether the result screen should show this report.
    pub surfaced: bool,
    /// Coins credited to the economy.
    pub reward: u32,
    /// Items stashed for the next attempt.
    pub carry_over: u32,
}

impl GradeReport {
    pub fn passed(&self) -> bool {
        self.grade.passed
    }

    pub fn percent(&self) -> u8 {
        self.grade.percent
    }
}
