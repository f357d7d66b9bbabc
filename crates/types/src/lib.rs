//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the sorter.
//! Everything here is plain data, usable from the gameplay core, the terminal
//! view, and the JSONL event log alike.
//!
//! # Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Frame interval used by the front-ends |
//! | `COUNTDOWN_TICK_MS` | 200 | Countdown recompute interval |
//! | `ORDER_PREVIEW_MS` | 4000 | Order preview before the countdown starts |
//! | `RETURN_TO_BELT_MIN_MS` | 100 | Minimum travel left after a cancelled drag |
//!
//! # Scoring Constants
//!
//! | Constant | Value |
//! |----------|-------|
//! | `PASS_THRESHOLD_PERCENT` | 70 |
//! | `MISSED_REQUIRED_PENALTY` | 25 points per unmatched required kind |
//! | `WRONG_IN_ORDER_PENALTY` | 10 points per wrong submission |
//! | `LEVEL_PASS_REWARD` | 100 coins |
//!
//! # Examples
//!
//! ```
//! use conveyor_sorter_types::{Freshness, KindSet, ProductKind};
//!
//! let fresh = Freshness::Fresh;
//! assert_eq!(fresh.degrade_one_step(), Freshness::Acceptable);
//! assert_eq!(Freshness::Rotten.degrade_one_step(), Freshness::Rotten);
//!
//! let set: KindSet = [ProductKind::Tomato, ProductKind::Apple].into_iter().collect();
//! assert!(set.contains(ProductKind::Apple));
//! assert_eq!(set.len(), 2);
//!
//! assert_eq!(ProductKind::from_str("TOMATO"), Some(ProductKind::Tomato));
//! ```

use std::fmt;

use serde::ser::{Serialize, Serializer};

/// Frame interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// The countdown is recomputed at this interval, matching a 0.2s UI timer.
pub const COUNTDOWN_TICK_MS: u32 = 200;

/// How long the order is shown before the countdown starts.
pub const ORDER_PREVIEW_MS: u32 = 4000;

/// Belt length in distance units. Travel time is `LANE_LENGTH / speed`.
pub const LANE_LENGTH: u32 = 350;

/// An item released outside every bin keeps at least this much travel.
pub const RETURN_TO_BELT_MIN_MS: u32 = 100;

/// Minimum final percentage for a passing grade.
pub const PASS_THRESHOLD_PERCENT: u8 = 70;

/// Points deducted per required kind never matched.
pub const MISSED_REQUIRED_PENALTY: f64 = 25.0;

/// Points deducted per wrong submission.
pub const WRONG_IN_ORDER_PENALTY: f64 = 10.0;

/// Coins credited when an attempt passes.
pub const LEVEL_PASS_REWARD: u32 = 100;

/// Product categories that can appear on the belt.
///
/// The first eight are vegetables, the last eight fruits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProductKind {
    Tomato,
    Cucumber,
    Eggplant,
    Carrot,
    Cabbage,
    Potato,
    Onion,
    Broccoli,
    Apple,
    Banana,
    Orange,
    Grape,
    Pear,
    Lemon,
    Strawberry,
    Pineapple,
}

impl ProductKind {
    /// Every kind, in declaration order.
    pub const ALL: [ProductKind; 16] = [
        ProductKind::Tomato,
        ProductKind::Cucumber,
        ProductKind::Eggplant,
        ProductKind::Carrot,
        ProductKind::Cabbage,
        ProductKind::Potato,
        ProductKind::Onion,
        ProductKind::Broccoli,
        ProductKind::Apple,
        ProductKind::Banana,
        ProductKind::Orange,
        ProductKind::Grape,
        ProductKind::Pear,
        ProductKind::Lemon,
        ProductKind::Strawberry,
        ProductKind::Pineapple,
    ];

    /// Position in [`ProductKind::ALL`]; also the bit used by [`KindSet`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_fruit(self) -> bool {
        matches!(
            self,
            ProductKind::Apple
                | ProductKind::Banana
                | ProductKind::Orange
                | ProductKind::Grape
                | ProductKind::Pear
                | ProductKind::Lemon
                | ProductKind::Strawberry
                | ProductKind::Pineapple
        )
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            ProductKind::Tomato => "Tomato",
            ProductKind::Cucumber => "Cucumber",
            ProductKind::Eggplant => "Eggplant",
            ProductKind::Carrot => "Carrot",
            ProductKind::Cabbage => "Cabbage",
            ProductKind::Potato => "Potato",
            ProductKind::Onion => "Onion",
            ProductKind::Broccoli => "Broccoli",
            ProductKind::Apple => "Apple",
            ProductKind::Banana => "Banana",
            ProductKind::Orange => "Orange",
            ProductKind::Grape => "Grape",
            ProductKind::Pear => "Pear",
            ProductKind::Lemon => "Lemon",
            ProductKind::Strawberry => "Strawberry",
            ProductKind::Pineapple => "Pineapple",
        }
    }

    /// Three-letter code used where space is tight (belt cells).
    pub fn short(self) -> &'static str {
        match self {
            ProductKind::Tomato => "Tom",
            ProductKind::Cucumber => "Cuc",
            ProductKind::Eggplant => "Egg",
            ProductKind::Carrot => "Car",
            ProductKind::Cabbage => "Cab",
            ProductKind::Potato => "Pot",
            ProductKind::Onion => "Oni",
            ProductKind::Broccoli => "Bro",
            ProductKind::Apple => "App",
            ProductKind::Banana => "Ban",
            ProductKind::Orange => "Orn",
            ProductKind::Grape => "Grp",
            ProductKind::Pear => "Per",
            ProductKind::Lemon => "Lem",
            ProductKind::Strawberry => "Str",
            ProductKind::Pineapple => "Pin",
        }
    }

    /// Lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            ProductKind::Tomato => "tomato",
            ProductKind::Cucumber => "cucumber",
            ProductKind::Eggplant => "eggplant",
            ProductKind::Carrot => "carrot",
            ProductKind::Cabbage => "cabbage",
            ProductKind::Potato => "potato",
            ProductKind::Onion => "onion",
            ProductKind::Broccoli => "broccoli",
            ProductKind::Apple => "apple",
            ProductKind::Banana => "banana",
            ProductKind::Orange => "orange",
            ProductKind::Grape => "grape",
            ProductKind::Pear => "pear",
            ProductKind::Lemon => "lemon",
            ProductKind::Strawberry => "strawberry",
            ProductKind::Pineapple => "pineapple",
        }
    }

    /// Parse a kind from its identifier (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use conveyor_sorter_types::ProductKind;
    ///
    /// assert_eq!(ProductKind::from_str("lemon"), Some(ProductKind::Lemon));
    /// assert_eq!(ProductKind::from_str("Broccoli"), Some(ProductKind::Broccoli));
    /// assert_eq!(ProductKind::from_str("kiwi"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        let lowered = s.to_lowercase();
        ProductKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == lowered)
    }
}

impl Serialize for ProductKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Freshness levels, ordered from worst to best.
///
/// Degradation only ever moves down: fresh → acceptable → rotten, and rotten
/// stays rotten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Freshness {
    Rotten,
    Acceptable,
    Fresh,
}

impl Freshness {
    pub const ALL: [Freshness; 3] = [Freshness::Fresh, Freshness::Acceptable, Freshness::Rotten];

    /// The next lower level, or `None` at rotten.
    pub fn next_lower(self) -> Option<Freshness> {
        match self {
            Freshness::Fresh => Some(Freshness::Acceptable),
            Freshness::Acceptable => Some(Freshness::Rotten),
            Freshness::Rotten => None,
        }
    }

    /// Degrade by one step, idempotent at rotten.
    ///
    /// # Examples
    ///
    /// ```
    /// use conveyor_sorter_types::Freshness;
    ///
    /// let rotten = Freshness::Fresh
    ///     .degrade_one_step()
    ///     .degrade_one_step()
    ///     .degrade_one_step();
    /// assert_eq!(rotten, Freshness::Rotten);
    /// assert_eq!(Freshness::Rotten.degrade_one_step(), Freshness::Rotten);
    /// ```
    pub fn degrade_one_step(self) -> Freshness {
        self.next_lower().unwrap_or(Freshness::Rotten)
    }

    /// Weight applied to a matched item when averaging freshness.
    pub fn score_weight(self) -> f64 {
        match self {
            Freshness::Fresh => 1.0,
            Freshness::Acceptable => 0.7,
            Freshness::Rotten => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Freshness::Fresh => "fresh",
            Freshness::Acceptable => "acceptable",
            Freshness::Rotten => "rotten",
        }
    }
}

impl Serialize for Freshness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Drop destinations.
///
/// - **Order**: submit the item toward the active recipe
/// - **Good**: stash a surplus item for the next level
/// - **Trash**: discard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinType {
    Order,
    Good,
    Trash,
}

impl BinType {
    pub const ALL: [BinType; 3] = [BinType::Order, BinType::Good, BinType::Trash];

    pub fn as_str(self) -> &'static str {
        match self {
            BinType::Order => "order",
            BinType::Good => "good",
            BinType::Trash => "trash",
        }
    }

    /// Parse a bin from its identifier (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "order" => Some(BinType::Order),
            "good" => Some(BinType::Good),
            "trash" => Some(BinType::Trash),
            _ => None,
        }
    }
}

impl Serialize for BinType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Why an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndReason {
    TimeUp,
    OutOfMoves,
    FinishedStream,
    /// Manual exit. The attempt is still graded but no result is shown.
    Aborted,
}

impl EndReason {
    /// Whether the result screen should be shown for this reason.
    pub fn surfaces_result(self) -> bool {
        !matches!(self, EndReason::Aborted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::TimeUp => "timeUp",
            EndReason::OutOfMoves => "outOfMoves",
            EndReason::FinishedStream => "finishedStream",
            EndReason::Aborted => "aborted",
        }
    }
}

impl Serialize for EndReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Unique product identifier: the attempt generation that spawned it plus a
/// per-attempt serial. Carry-over items keep the id they were spawned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct ProductId {
    pub generation: u32,
    pub serial: u32,
}

impl ProductId {
    pub const fn new(generation: u32, serial: u32) -> Self {
        Self { generation, serial }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.generation, self.serial)
    }
}

/// One physical item on (or off) the belt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Product {
    pub id: ProductId,
    pub kind: ProductKind,
    pub freshness: Freshness,
    pub from_carry_over: bool,
}

impl Product {
    pub fn new(id: ProductId, kind: ProductKind, freshness: Freshness) -> Self {
        Self {
            id,
            kind,
            freshness,
            from_carry_over: false,
        }
    }

    /// The copy stashed for the next level: one freshness step lower and
    /// flagged as carry-over. Rotten items cannot be carried.
    pub fn carry_over_copy(&self) -> Option<Product> {
        if self.freshness == Freshness::Rotten {
            return None;
        }
        Some(Product {
            freshness: self.freshness.degrade_one_step(),
            from_carry_over: true,
            ..*self
        })
    }
}

/// A set of product kinds stored as a 16-bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u16);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);

    pub fn new() -> Self {
        Self::EMPTY
    }

    pub fn from_slice(kinds: &[ProductKind]) -> Self {
        kinds.iter().copied().collect()
    }

    /// Insert a kind; returns `true` if it was not already present.
    pub fn insert(&mut self, kind: ProductKind) -> bool {
        let bit = 1u16 << kind.index();
        let fresh = self.0 & bit == 0;
        self.0 |= bit;
        fresh
    }

    pub fn contains(&self, kind: ProductKind) -> bool {
        self.0 & (1u16 << kind.index()) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Kinds in `self` that are not in `other`.
    pub fn difference(&self, other: &KindSet) -> KindSet {
        KindSet(self.0 & !other.0)
    }

    pub fn intersection(&self, other: &KindSet) -> KindSet {
        KindSet(self.0 & other.0)
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = ProductKind> + '_ {
        ProductKind::ALL
            .iter()
            .copied()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<ProductKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = ProductKind>>(iter: I) -> Self {
        let mut set = KindSet::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl Serialize for KindSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_constants() {
        assert_eq!(PASS_THRESHOLD_PERCENT, 70);
        assert_eq!(MISSED_REQUIRED_PENALTY, 25.0);
        assert_eq!(WRONG_IN_ORDER_PENALTY, 10.0);
        assert_eq!(LEVEL_PASS_REWARD, 100);
        assert_eq!(COUNTDOWN_TICK_MS, 200);
    }

    #[test]
    fn test_fruit_split() {
        let fruits = ProductKind::ALL.iter().filter(|k| k.is_fruit()).count();
        assert_eq!(fruits, 8);
        assert!(!ProductKind::Tomato.is_fruit());
        assert!(ProductKind::Pineapple.is_fruit());
    }

    #[test]
    fn test_kind_round_trip_names() {
        for kind in ProductKind::ALL {
            assert_eq!(ProductKind::from_str(kind.as_str()), Some(kind));
            assert_eq!(kind.short().len(), 3);
        }
    }

    #[test]
    fn test_degrade_is_idempotent_at_rotten() {
        let once = Freshness::Fresh.degrade_one_step();
        let twice = once.degrade_one_step();
        let thrice = twice.degrade_one_step();
        assert_eq!(once, Freshness::Acceptable);
        assert_eq!(twice, Freshness::Rotten);
        assert_eq!(thrice, Freshness::Rotten);
        assert_eq!(Freshness::Rotten.degrade_one_step(), Freshness::Rotten);
        assert_eq!(Freshness::Rotten.next_lower(), None);
    }

    #[test]
    fn test_score_weights() {
        assert_eq!(Freshness::Fresh.score_weight(), 1.0);
        assert_eq!(Freshness::Acceptable.score_weight(), 0.7);
        assert_eq!(Freshness::Rotten.score_weight(), 0.0);
        assert!(Freshness::Fresh > Freshness::Acceptable);
    }

    #[test]
    fn test_carry_over_copy() {
        let id = ProductId::new(1, 7);
        let p = Product::new(id, ProductKind::Pear, Freshness::Acceptable);
        let carried = p.carry_over_copy().unwrap();
        assert_eq!(carried.freshness, Freshness::Rotten);
        assert!(carried.from_carry_over);
        assert_eq!(carried.id, id);

        let rotten = Product::new(id, ProductKind::Pear, Freshness::Rotten);
        assert!(rotten.carry_over_copy().is_none());
    }

    #[test]
    fn test_kind_set_operations() {
        let mut set = KindSet::new();
        assert!(set.is_empty());
        assert!(set.insert(ProductKind::Tomato));
        assert!(!set.insert(ProductKind::Tomato));
        set.insert(ProductKind::Lemon);
        assert_eq!(set.len(), 2);

        let required = KindSet::from_slice(&[ProductKind::Tomato, ProductKind::Cucumber]);
        let missing = required.difference(&set);
        assert_eq!(missing.iter().collect::<Vec<_>>(), vec![ProductKind::Cucumber]);
        assert_eq!(required.intersection(&set).len(), 1);

        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_end_reason_surfacing() {
        assert!(EndReason::TimeUp.surfaces_result());
        assert!(EndReason::OutOfMoves.surfaces_result());
        assert!(EndReason::FinishedStream.surfaces_result());
        assert!(!EndReason::Aborted.surfaces_result());
    }

    #[test]
    fn test_bin_parse() {
        for bin in BinType::ALL {
            assert_eq!(BinType::from_str(bin.as_str()), Some(bin));
        }
        assert_eq!(BinType::from_str("ORDER"), Some(BinType::Order));
        assert_eq!(BinType::from_str("shelf"), None);
    }
}
