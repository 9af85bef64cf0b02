//! Compiled rendering rules: paint/layout fragments, the assembled rule
//! record, and the draw-order key.
//!
//! A [`Fragment`] is what one symbology command contributes; a [`Rule`]
//! is a fragment after lookup resolution has attached the filters, the
//! sort key and a stable identifier. Rules are plain serializable data
//! for an external rendering engine -- nothing here draws.

use crate::filter::{self, Filter};
use serde::Serialize;

/// Draw type of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    Fill,
    Line,
    PointSymbol,
    Text,
    Background,
}

// ──────────────────────────────────────────────
// Value expressions
// ──────────────────────────────────────────────

/// A fill colour: a resolved hex value, or the depth-band selection the
/// depth-area procedure defers to render time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColourValue {
    Hex(String),
    DepthBands(DepthBands),
}

/// Render-time colour selection for depth areas: the band whose
/// thresholds both DRVAL1 and DRVAL2 clear picks the colour. A missing
/// DRVAL1 reads as -1; a missing DRVAL2 reads as DRVAL1 + 0.01.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthBands {
    pub shallow_depth: f64,
    pub safety_depth: f64,
    pub deep_depth: f64,
    /// Hex colour per band, deepest first.
    pub deep: String,
    pub medium: String,
    pub shallow: String,
    pub very_shallow: String,
    pub intertidal: String,
}

/// Symbol rotation: a literal angle in degrees clockwise from north, or
/// a per-feature attribute resolved at render time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    Degrees(f64),
    Attribute(String),
}

/// A text label value, resolved against feature attributes at render
/// time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextValue {
    Literal(String),
    /// The raw value of an attribute.
    Attribute(String),
    /// Numeric formatting of an attribute value with a fixed number of
    /// fractional digits; `floor` rounds the value down first.
    NumberFormat {
        attribute: String,
        fraction_digits: u32,
        floor: bool,
    },
    /// Left-to-right concatenation.
    Concat(Vec<TextValue>),
    /// First matching case wins, else the fallback.
    Case {
        cases: Vec<TextCase>,
        fallback: Box<TextValue>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextCase {
    pub when: Filter,
    pub then: TextValue,
}

/// Text anchor relative to the pivot point, combined from the
/// horizontal and vertical justification parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    Center,
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Where a symbol or label sits relative to its feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Point,
    Line,
}

// ──────────────────────────────────────────────
// Paint and layout
// ──────────────────────────────────────────────

/// Colour and stroke properties. Only the fields relevant to the rule's
/// kind are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Paint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_colour: Option<ColourValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    /// Dash/gap lengths in the renderer's dash-array convention.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_dash: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_halo_colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_halo_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_colour: Option<String>,
}

/// Symbol and text placement properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    /// Symbol graphic name, resolved by the renderer's asset registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_rotation: Option<Rotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_anchor: Option<Anchor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_font: Option<String>,
    /// Body size in pica points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_size: Option<u32>,
    /// Pivot offset in units of body size; positive x right, positive y
    /// down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_offset: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_max_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    /// Text display grouping from the TX/TE display parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_group: Option<String>,
}

// ──────────────────────────────────────────────
// Fragments and rules
// ──────────────────────────────────────────────

/// One rendering-rule fragment as produced by a symbology command,
/// before lookup filters and ordering are attached. `filter` carries
/// only the fragment-intrinsic condition some conditional procedures
/// emit.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: RuleKind,
    pub filter: Option<Filter>,
    pub paint: Paint,
    pub layout: Layout,
}

impl Fragment {
    pub fn new(kind: RuleKind) -> Fragment {
        Fragment {
            kind,
            filter: None,
            paint: Paint::default(),
            layout: Layout::default(),
        }
    }
}

/// A fully assembled rendering rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub id: String,
    pub kind: RuleKind,
    /// Source object class; absent for the background rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    pub paint: Paint,
    pub layout: Layout,
    pub sort_key: i32,
}

impl Rule {
    /// Assemble the final rule from its named components in one step:
    /// the command's fragment, the lookup-derived filters (ANDed ahead
    /// of the fragment's own), and the entry's display priority.
    pub fn assemble(
        id: String,
        object_class: Option<String>,
        fragment: Fragment,
        lookup_filters: Vec<Filter>,
        display_priority: u8,
    ) -> Rule {
        let mut filters = lookup_filters;
        if let Some(own) = fragment.filter {
            filters.push(own);
        }
        Rule {
            id,
            kind: fragment.kind,
            object_class,
            filter: filter::all(filters),
            paint: fragment.paint,
            layout: fragment.layout,
            sort_key: sort_key(display_priority, fragment.kind),
        }
    }
}

/// Draw-order key: display priority times ten plus a type offset, so
/// point symbols draw over lines over fills within one priority, and
/// text always lands last in its band.
pub fn sort_key(display_priority: u8, kind: RuleKind) -> i32 {
    let offset = match kind {
        RuleKind::Background => 0,
        RuleKind::PointSymbol | RuleKind::Text => 1,
        RuleKind::Line => 2,
        RuleKind::Fill => 3,
    };
    let offset = if kind == RuleKind::Text { offset + 1 } else { offset };
    i32::from(display_priority) * 10 + offset
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_draw_under_lines_under_points() {
        assert_eq!(sort_key(5, RuleKind::Fill), 53);
        assert_eq!(sort_key(5, RuleKind::Line), 52);
        assert_eq!(sort_key(5, RuleKind::PointSymbol), 51);
    }

    #[test]
    fn text_lands_last_in_its_priority_band() {
        assert_eq!(sort_key(5, RuleKind::Text), 52);
        assert_eq!(sort_key(0, RuleKind::Background), 0);
    }

    #[test]
    fn assemble_merges_lookup_and_fragment_filters() {
        let mut fragment = Fragment::new(RuleKind::Line);
        fragment.filter = Some(Filter::has("QUAPOS"));
        let rule = Rule::assemble(
            "1-DEPCNT-L".to_owned(),
            Some("DEPCNT".to_owned()),
            fragment,
            vec![Filter::has("SCAMIN")],
            5,
        );
        assert_eq!(
            rule.filter,
            Some(Filter::All(vec![
                Filter::has("SCAMIN"),
                Filter::has("QUAPOS"),
            ]))
        );
        assert_eq!(rule.sort_key, 52);
    }

    #[test]
    fn assemble_with_no_filters_leaves_none() {
        let rule = Rule::assemble(
            "background".to_owned(),
            None,
            Fragment::new(RuleKind::Background),
            vec![],
            0,
        );
        assert_eq!(rule.filter, None);
    }
}
