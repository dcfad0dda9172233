//! Domain Models
//!
//! Cart lines and the course metadata handed to the cart by the content layer.
//! Uses `rust_decimal` for all monetary values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::offer::{compute_offer_totals, OfferChoice, OfferTotals};

/// What the UI hands to the cart when adding a course
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Course identifier (unique key within the cart)
    pub course_id: String,

    /// Display title
    pub title: String,

    /// Pre-discount reference price (display only)
    pub unit_price: Decimal,

    /// Price actually charged per unit
    pub unit_discount_price: Decimal,

    /// Instructor name
    pub instructor: String,

    /// Optional thumbnail URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl CartLineInput {
    pub fn new(
        course_id: impl Into<String>,
        title: impl Into<String>,
        unit_price: Decimal,
        unit_discount_price: Decimal,
        instructor: impl Into<String>,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            title: title.into(),
            unit_price,
            unit_discount_price,
            instructor: instructor.into(),
            thumbnail: None,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }
}

/// One course entry in the cart with its quantity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub course_id: String,
    pub title: String,
    pub unit_price: Decimal,
    pub unit_discount_price: Decimal,
    pub instructor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Always >= 1 while the line is in a cart
    pub quantity: u32,
}

impl CartLine {
    /// Create a line with quantity 1
    pub fn from_input(input: CartLineInput) -> Self {
        Self {
            course_id: input.course_id,
            title: input.title,
            unit_price: input.unit_price,
            unit_discount_price: input.unit_discount_price,
            instructor: input.instructor,
            thumbnail: input.thumbnail,
            quantity: 1,
        }
    }

    /// Charged amount for this line
    pub fn line_total(&self) -> Decimal {
        self.unit_discount_price * Decimal::from(self.quantity)
    }
}

/// Ordered collection of cart lines.
///
/// Order only matters for display; totals are order-independent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from raw lines, restoring the cart invariants.
    ///
    /// Lines with quantity 0 are dropped and repeated course ids are merged
    /// into the first occurrence.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            match cart.position(&line.course_id) {
                Some(idx) => {
                    let existing = &mut cart.lines[idx];
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities across lines
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of `unit_discount_price × quantity`
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn contains(&self, course_id: &str) -> bool {
        self.position(course_id).is_some()
    }

    pub fn get(&self, course_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.course_id == course_id)
    }

    /// Add one unit; returns the resulting quantity
    pub(crate) fn add(&mut self, input: CartLineInput) -> u32 {
        match self.position(&input.course_id) {
            Some(idx) => {
                let line = &mut self.lines[idx];
                line.quantity = line.quantity.saturating_add(1);
                line.quantity
            }
            None => {
                self.lines.push(CartLine::from_input(input));
                1
            }
        }
    }

    /// Returns whether a line was removed
    pub(crate) fn remove(&mut self, course_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.course_id != course_id);
        self.lines.len() != before
    }

    /// Returns whether a line was found
    pub(crate) fn set_quantity(&mut self, course_id: &str, quantity: u32) -> bool {
        match self.lines.iter_mut().find(|l| l.course_id == course_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
    }

    fn position(&self, course_id: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.course_id == course_id)
    }
}

/// A course bundled into an offer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedCourse {
    pub course_id: String,
    pub name: String,

    /// Regular price
    pub price: Decimal,

    /// Discounted price inside the bundle
    pub discount: Decimal,
}

/// Optional bundle offer attached to a course
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub active: bool,
    pub title: String,
    #[serde(default)]
    pub included_courses: Vec<IncludedCourse>,
}

impl Offer {
    /// Only active offers with at least one course can be acted on
    pub fn is_actionable(&self) -> bool {
        self.active && !self.included_courses.is_empty()
    }

    pub fn totals(&self) -> OfferTotals {
        compute_offer_totals(&self.included_courses)
    }
}

/// Course metadata as delivered by the catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub price: Decimal,
    pub discount_price: Decimal,
    pub instructor: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub offer: Option<Offer>,
}

impl Course {
    /// The offer, if it can be presented to the user
    pub fn actionable_offer(&self) -> Option<&Offer> {
        self.offer.as_ref().filter(|o| o.is_actionable())
    }

    /// Cart line for this course alone
    pub fn as_line(&self) -> CartLineInput {
        CartLineInput {
            course_id: self.id.clone(),
            title: self.title.clone(),
            unit_price: self.price,
            unit_discount_price: self.discount_price,
            instructor: self.instructor.clone(),
            thumbnail: self.thumbnail.clone(),
        }
    }

    /// Lines to add for the user's choice.
    ///
    /// `WholeBundle` falls back to the single course when the offer is not
    /// actionable.
    pub fn cart_lines(&self, choice: OfferChoice) -> Vec<CartLineInput> {
        match (choice, self.actionable_offer()) {
            (OfferChoice::WholeBundle, Some(offer)) => offer
                .included_courses
                .iter()
                .map(|included| CartLineInput {
                    course_id: included.course_id.clone(),
                    title: included.name.clone(),
                    unit_price: included.price,
                    unit_discount_price: included.discount,
                    instructor: self.instructor.clone(),
                    thumbnail: None,
                })
                .collect(),
            _ => vec![self.as_line()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(id: &str, quantity: u32) -> CartLine {
        let mut line = CartLine::from_input(CartLineInput::new(id, id, dec!(100), dec!(80), "Ada"));
        line.quantity = quantity;
        line
    }

    fn course_with_offer(active: bool) -> Course {
        Course {
            id: "rust-101".into(),
            title: "Rust 101".into(),
            price: dec!(100),
            discount_price: dec!(80),
            instructor: "Ferris".into(),
            thumbnail: Some("/img/rust.png".into()),
            offer: Some(Offer {
                active,
                title: "Systems bundle".into(),
                included_courses: vec![
                    IncludedCourse {
                        course_id: "rust-101".into(),
                        name: "Rust 101".into(),
                        price: dec!(100),
                        discount: dec!(70),
                    },
                    IncludedCourse {
                        course_id: "async-201".into(),
                        name: "Async Rust".into(),
                        price: dec!(50),
                        discount: dec!(40),
                    },
                ],
            }),
        }
    }

    #[test]
    fn test_from_lines_merges_and_drops_zero() {
        let cart = Cart::from_lines(vec![line("a", 1), line("b", 0), line("a", 2)]);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.get("a").map(|l| l.quantity), Some(3));
        assert!(!cart.contains("b"));
    }

    #[test]
    fn test_line_totals_use_discount_price() {
        let cart = Cart::from_lines(vec![line("a", 2), line("b", 1)]);
        assert_eq!(cart.total_price(), dec!(240));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_persisted_shape_is_camel_case() {
        let cart = Cart::from_lines(vec![line("a", 1)]);
        let json = serde_json::to_value(&cart).unwrap();
        let first = &json[0];
        assert_eq!(first["courseId"], "a");
        assert!(first.get("unitDiscountPrice").is_some());
        assert!(first.get("thumbnail").is_none());
    }

    #[test]
    fn test_numeric_prices_are_accepted() {
        let raw = r#"[{"courseId":"a","title":"A","unitPrice":100,"unitDiscountPrice":79.5,"instructor":"Ada","quantity":2}]"#;
        let cart: Cart = serde_json::from_str(raw).unwrap();
        assert_eq!(cart.total_price(), dec!(159));
    }

    #[test]
    fn test_bundle_lines() {
        let course = course_with_offer(true);
        let lines = course.cart_lines(OfferChoice::WholeBundle);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_discount_price, dec!(70));
        assert_eq!(lines[1].course_id, "async-201");
        assert_eq!(lines[1].instructor, "Ferris");

        let single = course.cart_lines(OfferChoice::SingleCourse);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].unit_discount_price, dec!(80));
        assert_eq!(single[0].thumbnail.as_deref(), Some("/img/rust.png"));
    }

    #[test]
    fn test_inactive_offer_falls_back_to_single() {
        let course = course_with_offer(false);
        assert!(course.actionable_offer().is_none());
        let lines = course.cart_lines(OfferChoice::WholeBundle);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].course_id, "rust-101");
    }
}
