//! Declarative filter expression trees attached to compiled rules.
//!
//! The core never evaluates a filter: the rendering engine applies them
//! to real feature attributes at draw time. Everything here is plain
//! data, serialized alongside the rule it guards.

use crate::model::{AttributeCondition, GeometryKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
}

/// A boolean expression over feature attributes.
///
/// An empty conjunction is vacuously true; combinators below never emit
/// one, but consumers must honour the convention.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    All(Vec<Filter>),
    Any(Vec<Filter>),
    Not(Box<Filter>),
    /// The feature carries the attribute.
    Has(String),
    /// The attribute's value equals the given text.
    Equals { attribute: String, value: String },
    /// Numeric comparison of an attribute value; used by the conditional
    /// symbology procedures.
    Compare {
        attribute: String,
        op: CompareOp,
        value: f64,
    },
    /// The feature's geometry is of the given kind.
    Geometry(GeometryKind),
    /// The display scale denominator lies between the feature's optional
    /// SCAMIN/SCAMAX bounds. `constant` converts the renderer's zoom
    /// level to a scale denominator; an absent bound removes that side
    /// of the constraint.
    ScaleRange { constant: f64 },
}

impl Filter {
    pub fn equals(attribute: &str, value: &str) -> Filter {
        Filter::Equals {
            attribute: attribute.to_owned(),
            value: value.to_owned(),
        }
    }

    pub fn has(attribute: &str) -> Filter {
        Filter::Has(attribute.to_owned())
    }

    pub fn compare(attribute: &str, op: CompareOp, value: f64) -> Filter {
        Filter::Compare {
            attribute: attribute.to_owned(),
            op,
            value,
        }
    }
}

/// Conjunction that collapses trivial shapes: none -> `None`, one ->
/// the filter itself.
pub fn all(filters: Vec<Filter>) -> Option<Filter> {
    let mut filters = filters;
    match filters.len() {
        0 => None,
        1 => filters.pop(),
        _ => Some(Filter::All(filters)),
    }
}

/// Filters for an entry's ordered attribute conditions: an empty value
/// is a presence check, the value "?" requires absence, anything else is
/// an equality match.
pub fn attribute_conditions(conditions: &[AttributeCondition]) -> Vec<Filter> {
    conditions
        .iter()
        .map(|c| match c.value.as_str() {
            "" => Filter::Has(c.label.clone()),
            "?" => Filter::Not(Box::new(Filter::Has(c.label.clone()))),
            value => Filter::Equals {
                attribute: c.label.clone(),
                value: value.to_owned(),
            },
        })
        .collect()
}

const EQUATORIAL_RADIUS_M: f64 = 6_378_137.0;

/// Scale denominator at the renderer's base zoom for the given tile
/// size, assuming the conventional 0.28 mm display pixel.
pub fn scale_denominator_constant(tile_size: u32) -> f64 {
    let circumference = 2.0 * std::f64::consts::PI * EQUATORIAL_RADIUS_M;
    (circumference / (tile_size as f64 * 0.00028)).round()
}

/// The SCAMIN/SCAMAX visibility guard for the given tile size.
pub fn scale_range(tile_size: u32) -> Filter {
    Filter::ScaleRange {
        constant: scale_denominator_constant(tile_size),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(label: &str, value: &str) -> AttributeCondition {
        AttributeCondition {
            label: label.to_owned(),
            value: value.to_owned(),
        }
    }

    #[test]
    fn empty_value_checks_presence() {
        let filters = attribute_conditions(&[condition("CAT_TS3", ""), condition("ORIENT", "")]);
        assert_eq!(
            filters,
            vec![Filter::has("CAT_TS3"), Filter::has("ORIENT")]
        );
    }

    #[test]
    fn question_mark_checks_absence() {
        let filters = attribute_conditions(&[condition("DRVAL1", "?"), condition("DRVAL2", "?")]);
        assert_eq!(
            filters,
            vec![
                Filter::Not(Box::new(Filter::has("DRVAL1"))),
                Filter::Not(Box::new(Filter::has("DRVAL2"))),
            ]
        );
    }

    #[test]
    fn other_values_check_equality() {
        let filters = attribute_conditions(&[condition("CATACH", "1")]);
        assert_eq!(filters, vec![Filter::equals("CATACH", "1")]);
    }

    #[test]
    fn all_collapses_trivial_shapes() {
        assert_eq!(all(vec![]), None);
        assert_eq!(all(vec![Filter::has("A")]), Some(Filter::has("A")));
        assert_eq!(
            all(vec![Filter::has("A"), Filter::has("B")]),
            Some(Filter::All(vec![Filter::has("A"), Filter::has("B")]))
        );
    }

    #[test]
    fn scale_constant_for_the_default_tile_size() {
        // 2 * pi * 6378137 / (512 * 0.00028), rounded to a whole number.
        let constant = scale_denominator_constant(512);
        assert_eq!(constant, 279_541_132.0);
    }
}
