//! Catalog module - static recipes and per-level configuration
//!
//! `LevelConfig::for_level(n)` is a pure function of the level number except
//! for the recipe, which is a uniform draw from [`ORDER_CATALOG`]. The draw
//! never fails: [`OrderSpec::drawn_from`] falls back to
//! [`OrderSpec::fallback`] when handed an empty pool.

use serde::Serialize;

use crate::rng::SimpleRng;
use crate::types::{KindSet, ProductKind, LANE_LENGTH};

/// A recipe the player must fill during one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSpec {
    pub title: &'static str,
    pub description: &'static str,
    /// Required kinds in display order. Never empty for catalog entries.
    pub required: &'static [ProductKind],
    /// Only `fresh` items count toward the recipe.
    pub strict_fresh_only: bool,
}

const SMOOTHIE: OrderSpec = OrderSpec {
    title: "Fruit smoothie",
    description: "We need fruit for a fresh summer smoothie! Collect bright, ripe produce.",
    required: &[
        ProductKind::Apple,
        ProductKind::Banana,
        ProductKind::Orange,
        ProductKind::Strawberry,
    ],
    strict_fresh_only: false,
};

const VEGETABLE_SALAD: OrderSpec = OrderSpec {
    title: "Fresh vegetable salad",
    description: "Only the freshest vegetables. No compromises on quality!",
    required: &[
        ProductKind::Cucumber,
        ProductKind::Tomato,
        ProductKind::Broccoli,
    ],
    strict_fresh_only: true,
};

const FRUIT_SALAD: OrderSpec = OrderSpec {
    title: "Fresh fruit salad",
    description: "Only the freshest fruit. No compromises on quality!",
    required: &[
        ProductKind::Eggplant,
        ProductKind::Grape,
        ProductKind::Apple,
        ProductKind::Lemon,
    ],
    strict_fresh_only: true,
};

/// Recipes a level can draw from.
pub const ORDER_CATALOG: [OrderSpec; 3] = [SMOOTHIE, VEGETABLE_SALAD, FRUIT_SALAD];

impl OrderSpec {
    /// The recipe used whenever a draw comes up empty.
    pub const fn fallback() -> OrderSpec {
        FRUIT_SALAD
    }

    /// Uniform draw from `pool`, guaranteed to yield a recipe with a
    /// non-empty required set.
    pub fn drawn_from(pool: &[OrderSpec], rng: &mut SimpleRng) -> OrderSpec {
        match rng.pick(pool) {
            Some(order) if !order.required.is_empty() => *order,
            _ => OrderSpec::fallback(),
        }
    }

    pub fn required_set(&self) -> KindSet {
        KindSet::from_slice(self.required)
    }

    pub fn requires(&self, kind: ProductKind) -> bool {
        self.required.contains(&kind)
    }
}

/// Derived parameters for one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelConfig {
    pub level: u32,
    pub lanes: u32,
    pub spawn_interval_ms: u32,
    /// Belt speed in distance units per second.
    pub belt_speed: u32,
    pub time_limit_ms: u32,
    pub move_limit: u32,
    pub order: OrderSpec,
}

impl LevelConfig {
    /// Configuration for level `n` with a recipe drawn from the catalog.
    ///
    /// Levels below 1 are treated as level 1.
    pub fn for_level(n: u32, rng: &mut SimpleRng) -> Self {
        let order = OrderSpec::drawn_from(&ORDER_CATALOG, rng);
        Self::for_level_with_order(n, order)
    }

    /// Deterministic configuration for level `n` with a fixed recipe.
    pub fn for_level_with_order(n: u32, order: OrderSpec) -> Self {
        let n = n.max(1);
        // One extra lane every two levels.
        let lanes = 1 + (n - 1) / 2;
        let spawn_interval_ms = 1600u32.saturating_sub(200u32.saturating_mul(n)).max(700);
        let belt_speed = 120u32.saturating_add(30u32.saturating_mul(n));
        let time_limit_ms = 55_000u32.saturating_sub(5_000u32.saturating_mul(n)).max(35_000);
        let move_limit = 28u32.saturating_sub(3u32.saturating_mul(n)).max(18);

        Self {
            level: n,
            lanes,
            spawn_interval_ms,
            belt_speed,
            time_limit_ms,
            move_limit,
            order,
        }
    }

    /// Cap on items (fresh and carried) emitted in one attempt.
    pub fn max_stream(&self) -> u32 {
        22u32
            .saturating_add(6u32.saturating_mul(self.level.saturating_sub(1)))
            .max(18)
    }

    /// Time an item takes to ride the full lane, in milliseconds.
    pub fn travel_ms(&self) -> u32 {
        let speed = self.belt_speed.max(1) as u64;
        ((LANE_LENGTH as u64 * 1000 + speed / 2) / speed) as u32
    }

    pub fn spawn_interval_secs(&self) -> f64 {
        self.spawn_interval_ms as f64 / 1000.0
    }

    pub fn time_limit_secs(&self) -> f64 {
        self.time_limit_ms as f64 / 1000.0
    }
}
