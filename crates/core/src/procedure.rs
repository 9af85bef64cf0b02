//! Conditional symbology procedures invoked by the CS command.
//!
//! The registry is closed and intentionally partial: the written
//! procedure catalogue is large, and a name without an implementation is
//! a logged no-op rather than an error, so a library that references an
//! unimplemented procedure still compiles everything else.

use crate::command::{colour_hex, Context};
use crate::error::Diagnostic;
use crate::filter::{CompareOp, Filter};
use crate::instruction::Param;
use crate::rule::{
    ColourValue, DepthBands, Fragment, Placement, RuleKind, TextCase, TextValue,
};

/// Dispatch a CS call. Unregistered names emit nothing.
pub fn call(
    params: &[Param],
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Fragment> {
    let Some(name) = params.first().and_then(Param::token) else {
        diagnostics.push(Diagnostic::warning("CS", "missing procedure name"));
        return Vec::new();
    };
    match name {
        "DEPARE03" => depth_area(ctx, diagnostics),
        "DEPCNT03" => depth_contour(ctx, diagnostics),
        // Entry procedure for restrictions; nothing to draw directly.
        "RESTRN01" => Vec::new(),
        other => {
            diagnostics.push(Diagnostic::warning(
                "CS",
                format!("procedure '{}' is not implemented", other),
            ));
            Vec::new()
        }
    }
}

/// DEPARE03 -- depth-area colour fill. The band selection depends on
/// per-feature DRVAL1/DRVAL2, so the colour is deferred to render time
/// as a [`DepthBands`] value.
fn depth_area(ctx: &Context<'_>, diagnostics: &mut Vec<Diagnostic>) -> Vec<Fragment> {
    let mut fragment = Fragment::new(RuleKind::Fill);
    fragment.paint.fill_colour = Some(ColourValue::DepthBands(seabed_bands(ctx, diagnostics)));
    vec![fragment]
}

/// SEABED01 -- the depth-band colour selection shared by the depth-area
/// procedures: thresholds from the compile configuration, band colours
/// from the active palette.
fn seabed_bands(ctx: &Context<'_>, diagnostics: &mut Vec<Diagnostic>) -> DepthBands {
    DepthBands {
        shallow_depth: ctx.config.shallow_depth,
        safety_depth: ctx.config.safety_depth,
        deep_depth: ctx.config.deep_depth,
        deep: colour_hex("DEPDW", "CS", ctx, diagnostics),
        medium: colour_hex("DEPMD", "CS", ctx, diagnostics),
        shallow: colour_hex("DEPMS", "CS", ctx, diagnostics),
        very_shallow: colour_hex("DEPVS", "CS", ctx, diagnostics),
        intertidal: colour_hex("DEPIT", "CS", ctx, diagnostics),
    }
}

/// DEPCNT03 -- depth contours, including the safety contour. Contours of
/// low-quality position draw dashed, the rest solid; the split needs two
/// fragments because the dash pattern cannot depend on feature data.
fn depth_contour(ctx: &Context<'_>, diagnostics: &mut Vec<Diagnostic>) -> Vec<Fragment> {
    let low_quality = Filter::All(vec![
        Filter::has("QUAPOS"),
        Filter::Any(vec![
            Filter::equals("QUAPOS", "1"),
            Filter::equals("QUAPOS", "10"),
            Filter::equals("QUAPOS", "11"),
        ]),
    ]);
    let contour_colour = colour_hex("DEPCN", "CS", ctx, diagnostics);

    let mut dashed = Fragment::new(RuleKind::Line);
    dashed.filter = Some(low_quality.clone());
    dashed.paint.line_dash = Some(vec![3.6, 1.8]);
    dashed.paint.line_width = Some(1.0);
    dashed.paint.line_colour = Some(contour_colour.clone());

    let mut solid = Fragment::new(RuleKind::Line);
    solid.filter = Some(Filter::Not(Box::new(low_quality)));
    solid.paint.line_width = Some(1.0);
    solid.paint.line_colour = Some(contour_colour);

    let mut fragments = vec![dashed, solid];
    fragments.extend(contour_labels(ctx, diagnostics));
    fragments
}

/// SAFCON01 -- contour value labels. Values below 31 keep their exact
/// zero-fraction rendering; deeper values are floored first.
fn contour_labels(ctx: &Context<'_>, diagnostics: &mut Vec<Diagnostic>) -> Vec<Fragment> {
    let mut label = Fragment::new(RuleKind::Text);
    label.filter = Some(Filter::All(vec![
        Filter::has("VALDCO"),
        Filter::compare("VALDCO", CompareOp::Gt, 0.0),
        Filter::compare("VALDCO", CompareOp::Lt, 99_999.0),
    ]));
    label.layout.text = Some(TextValue::Case {
        cases: vec![TextCase {
            when: Filter::compare("VALDCO", CompareOp::Lt, 31.0),
            then: TextValue::NumberFormat {
                attribute: "VALDCO".to_owned(),
                fraction_digits: 0,
                floor: false,
            },
        }],
        fallback: Box::new(TextValue::NumberFormat {
            attribute: "VALDCO".to_owned(),
            fraction_digits: 0,
            floor: true,
        }),
    });
    label.layout.text_size = Some(12);
    label.layout.text_font = Some("Metropolis Regular".to_owned());
    label.layout.placement = Some(Placement::Line);
    label.paint.text_colour = Some(colour_hex("CHBLK", "CS", ctx, diagnostics));
    label.paint.text_halo_colour = Some("rgba(255, 255, 255, 0.5)".to_owned());
    label.paint.text_halo_width = Some(1.0);
    vec![label]
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
