use serde::Serialize;

use crate::game_state::Phase;
use crate::grading::GradeReport;
use crate::spawner::{InFlight, ItemTicket};
use crate::types::{Freshness, KindSet, ProductKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub ticket: ItemTicket,
    pub kind: ProductKind,
    pub freshness: Freshness,
    pub from_carry_over: bool,
    pub lane: u32,
    /// 0.0 at the start of the lane, 1.0 at the end.
    pub progress: f32,
    pub remaining_ms: u32,
}

impl From<&InFlight> for ItemSnapshot {
    fn from(value: &InFlight) -> Self {
        Self {
            ticket: value.ticket,
            kind: value.product.kind,
            freshness: value.product.freshness,
            from_carry_over: value.product.from_carry_over,
            lane: value.lane,
            progress: value.progress(),
            remaining_ms: value.remaining_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSnapshot {
    pub generation: u32,
    pub level: u32,
    pub phase: Phase,
    pub lanes: u32,
    pub order_title: &'static str,
    pub order_description: &'static str,
    pub required: &'static [ProductKind],
    pub strict_fresh_only: bool,
    pub preview_left_ms: u32,
    pub time_left_ms: u32,
    pub moves_left: u32,
    pub matched: KindSet,
    pub wrong_in_order: u32,
    pub emitted: u32,
    pub max_stream: u32,
    /// Items stashed in the good bin so far this attempt.
    pub stashed: u32,
    /// Belt items, in emission order.
    pub items: Vec<ItemSnapshot>,
    pub held: Option<ItemSnapshot>,
    pub report: Option<GradeReport>,
    pub balance: u64,
}

impl LevelSnapshot {
    /// Whether drops are currently accepted.
    pub fn playable(&self) -> bool {
        matches!(self.phase, Phase::Preview | Phase::Playing)
    }

    /// Front-most belt item of `lane`.
    pub fn front_of_lane(&self, lane: u32) -> Option<&ItemSnapshot> {
        self.items
            .iter()
            .filter(|item| item.lane == lane)
            .min_by_key(|item| item.remaining_ms)
    }
}
