//! Sorting resolver - classifies one drop into its scoring effect
//!
//! | bin   | required | strict | outcome |
//! |-------|----------|--------|---------|
//! | order | yes      | yes, fresh      | match, weight 1.0 |
//! | order | yes      | yes, not fresh  | wrong in order |
//! | order | yes      | no              | match, weight = freshness weight |
//! | order | no       | -               | wrong in order |
//! | good  | no       | -               | carry a degraded copy (rotten is discarded) |
//! | good  | yes      | -               | wrong in order |
//! | trash | yes      | -               | wrong in order |
//! | trash | no       | -               | discard |
//!
//! Classification is pure; [`crate::session::SessionState::apply`] performs the
//! mutation.

use serde::Serialize;

use crate::catalog::OrderSpec;
use crate::types::{BinType, Freshness, Product, ProductKind};

/// Why a drop counted against the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WrongReason {
    /// Submitted a kind the recipe does not ask for.
    NotRequired,
    /// Submitted a required kind below fresh on a strict recipe.
    NotFresh,
    /// Stashed a required kind instead of submitting it.
    RequiredStashed,
    /// Threw a required kind away.
    RequiredTrashed,
}

/// Effect of one drop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SortOutcome {
    Matched { kind: ProductKind, weight: f64 },
    WrongInOrder { reason: WrongReason },
    CarriedOver { product: Product },
    Discarded,
}

impl SortOutcome {
    pub fn is_wrong(&self) -> bool {
        matches!(self, SortOutcome::WrongInOrder { .. })
    }
}

/// Classify dropping `product` into `bin` against `order`.
pub fn classify(product: &Product, bin: BinType, order: &OrderSpec) -> SortOutcome {
    let required = order.requires(product.kind);

    match (bin, required) {
        (BinType::Order, true) if order.strict_fresh_only => {
            if product.freshness == Freshness::Fresh {
                SortOutcome::Matched {
                    kind: product.kind,
                    weight: 1.0,
                }
            } else {
                SortOutcome::WrongInOrder {
                    reason: WrongReason::NotFresh,
                }
            }
        }
        (BinType::Order, true) => SortOutcome::Matched {
            kind: product.kind,
            weight: product.freshness.score_weight(),
        },
        (BinType::Order, false) => SortOutcome::WrongInOrder {
            reason: WrongReason::NotRequired,
        },
        (BinType::Good, false) => match product.carry_over_copy() {
            Some(copy) => SortOutcome::CarriedOver { product: copy },
            None => SortOutcome::Discarded,
        },
        (BinType::Good, true) => SortOutcome::WrongInOrder {
            reason: WrongReason::RequiredStashed,
        },
        (BinType::Trash, true) => SortOutcome::WrongInOrder {
            reason: WrongReason::RequiredTrashed,
        },
        (BinType::Trash, false) => SortOutcome::Discarded,
    }
}
