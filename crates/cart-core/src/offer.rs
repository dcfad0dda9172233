//! Bundle Offer Pricing
//!
//! Aggregate pricing for a course's bundle offer. Always recomputed from the
//! included courses; the inputs are small.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::model::IncludedCourse;

/// The two ways an actionable offer can be taken up
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferChoice {
    /// Add only the course being viewed
    #[default]
    SingleCourse,

    /// Add every included course as its own line
    WholeBundle,
}

/// Aggregate pricing for a bundle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferTotals {
    /// Sum of regular prices
    pub original_total: Decimal,

    /// Sum of bundle prices
    pub discounted_total: Decimal,

    /// `original_total - discounted_total`
    pub savings: Decimal,

    /// Savings as a whole percentage of `original_total`
    pub percent: Decimal,
}

/// Compute bundle totals.
///
/// `percent` is 0 when the original total is not positive.
pub fn compute_offer_totals(included: &[IncludedCourse]) -> OfferTotals {
    let original_total: Decimal = included.iter().map(|c| c.price).sum();
    let discounted_total: Decimal = included.iter().map(|c| c.discount).sum();
    let savings = original_total - discounted_total;

    let percent = if original_total > Decimal::ZERO {
        (savings * Decimal::ONE_HUNDRED / original_total)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    } else {
        Decimal::ZERO
    };

    OfferTotals {
        original_total,
        discounted_total,
        savings,
        percent,
    }
}
