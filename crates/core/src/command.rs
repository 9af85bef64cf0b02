//! Symbology command compilation.
//!
//! Each two-letter command maps through the closed [`Command`] registry
//! to a compiling function that turns parsed parameters into rendering
//! fragments, resolving colour and graphic references against the
//! library. An unknown command fails the enclosing instruction string;
//! an unresolvable graphic name does not -- the reference is emitted as
//! given and the rendering engine reports the missing asset.

use crate::colour::Palette;
use crate::compile::CompileConfig;
use crate::error::{Diagnostic, Error};
use crate::format;
use crate::instruction::{self, Param};
use crate::model::Library;
use crate::procedure;
use crate::rule::{Anchor, ColourValue, Fragment, Placement, Rotation, RuleKind, TextValue};

/// Shared read-only state for one compilation run.
pub struct Context<'a> {
    pub library: &'a Library,
    pub palette: &'a Palette,
    pub config: &'a CompileConfig,
}

/// The closed command registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Area fill with a colour token.
    Ac,
    /// Area fill with a named pattern.
    Ap,
    /// Conditional symbology procedure call.
    Cs,
    /// Line drawn with a named complex linestyle.
    Lc,
    /// Line with a predefined style, width and colour.
    Ls,
    /// Point symbol, optionally rotated.
    Sy,
    /// Text label from a format applied to an attribute.
    Te,
    /// Text label, literal or attribute-valued.
    Tx,
}

impl Command {
    pub fn from_code(code: &str) -> Option<Command> {
        match code {
            "AC" => Some(Command::Ac),
            "AP" => Some(Command::Ap),
            "CS" => Some(Command::Cs),
            "LC" => Some(Command::Lc),
            "LS" => Some(Command::Ls),
            "SY" => Some(Command::Sy),
            "TE" => Some(Command::Te),
            "TX" => Some(Command::Tx),
            _ => None,
        }
    }
}

/// Compile one instruction string into rendering fragments.
///
/// A syntax error or unknown command aborts this string only; the error
/// propagates to the caller, which isolates it to the lookup entry being
/// compiled.
pub fn compile_instructions(
    input: &str,
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<Fragment>, Error> {
    let mut fragments = Vec::new();
    for parsed in instruction::parse(input)? {
        let command = Command::from_code(&parsed.command)
            .ok_or_else(|| Error::UnknownCommand(parsed.command.clone()))?;
        fragments.extend(compile_command(command, &parsed.params, ctx, diagnostics)?);
    }
    Ok(fragments)
}

fn compile_command(
    command: Command,
    params: &[Param],
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<Fragment>, Error> {
    match command {
        Command::Ac => area_colour(params, ctx, diagnostics).map(|f| vec![f]),
        Command::Ap => area_pattern(params, ctx, diagnostics).map(|f| vec![f]),
        Command::Cs => Ok(procedure::call(params, ctx, diagnostics)),
        Command::Lc => line_complex(params, ctx, diagnostics).map(|f| vec![f]),
        Command::Ls => line_styled(params, ctx, diagnostics).map(|f| vec![f]),
        Command::Sy => point_symbol(params, ctx, diagnostics).map(|f| vec![f]),
        Command::Te => text_formatted(params, ctx, diagnostics).map(|f| vec![f]),
        Command::Tx => text_plain(params, ctx, diagnostics).map(|f| vec![f]),
    }
}

// ──────────────────────────────────────────────
// Area commands
// ──────────────────────────────────────────────

/// AC(COLOUR [,TRANSP]) -- colour fill. The transparency code maps to an
/// opacity; anything outside 0-3 reads as opaque.
fn area_colour(
    params: &[Param],
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Fragment, Error> {
    let token = name_param(params.first(), "AC", "a colour token")?;
    let opacity = match params.get(1).and_then(Param::number) {
        Some(code) if code == 1.0 => 0.75,
        Some(code) if code == 2.0 => 0.5,
        Some(code) if code == 3.0 => 0.25,
        _ => 1.0,
    };

    let mut fragment = Fragment::new(RuleKind::Fill);
    fragment.paint.fill_colour = Some(ColourValue::Hex(colour_hex(token, "AC", ctx, diagnostics)));
    fragment.paint.fill_opacity = Some(opacity);
    Ok(fragment)
}

/// AP(PATTERN) -- pattern fill. The graphic itself is the renderer's
/// concern; only the name reference is emitted.
fn area_pattern(
    params: &[Param],
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Fragment, Error> {
    let name = name_param(params.first(), "AP", "a pattern name")?;
    if ctx.library.pattern(name).is_none() {
        diagnostics.push(Diagnostic::warning(
            "AP",
            format!("pattern '{}' is not defined in the library", name),
        ));
    }
    let mut fragment = Fragment::new(RuleKind::Fill);
    fragment.paint.fill_pattern = Some(name.to_owned());
    Ok(fragment)
}

// ──────────────────────────────────────────────
// Line commands
// ──────────────────────────────────────────────

/// LS(PSTYLE, WIDTH, COLOUR) -- predefined line style. Width units are
/// 0.32 mm, the format's nominal pixel diameter.
fn line_styled(
    params: &[Param],
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Fragment, Error> {
    let style = name_param(params.first(), "LS", "a line style name")?;
    let width = params
        .get(1)
        .and_then(Param::number)
        .ok_or_else(|| Error::BadParameter {
            command: "LS",
            detail: "expected a numeric line width".to_owned(),
        })?;
    let colour = name_param(params.get(2), "LS", "a colour token")?;

    let dash = match style {
        "SOLD" => None,
        // dash 3.6 mm, space 1.8 mm
        "DASH" => Some(vec![3.6, 1.8]),
        // dot 0.6 mm, space 1.2 mm
        "DOTT" => Some(vec![0.6, 1.2]),
        other => {
            diagnostics.push(Diagnostic::warning(
                "LS",
                format!("unknown line style '{}', drawing solid", other),
            ));
            None
        }
    };

    let mut fragment = Fragment::new(RuleKind::Line);
    fragment.paint.line_colour = Some(colour_hex(colour, "LS", ctx, diagnostics));
    fragment.paint.line_width = Some(width);
    fragment.paint.line_dash = dash;
    Ok(fragment)
}

/// LC(LINNAM) -- complex linestyle by name; the pattern owns its own
/// colours and widths.
fn line_complex(
    params: &[Param],
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Fragment, Error> {
    let name = name_param(params.first(), "LC", "a linestyle name")?;
    if ctx.library.linestyle(name).is_none() {
        diagnostics.push(Diagnostic::warning(
            "LC",
            format!("linestyle '{}' is not defined in the library", name),
        ));
    }
    let mut fragment = Fragment::new(RuleKind::Line);
    fragment.paint.line_pattern = Some(name.to_owned());
    Ok(fragment)
}

// ──────────────────────────────────────────────
// Point symbols
// ──────────────────────────────────────────────

/// SY(SYMBOL [,ROT]) -- point symbol. Rotation is degrees clockwise from
/// north, or an attribute acronym resolved per feature at render time;
/// the default upright orientation is left implicit.
fn point_symbol(
    params: &[Param],
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Fragment, Error> {
    let name = name_param(params.first(), "SY", "a symbol name")?;
    if ctx.library.symbol(name).is_none() {
        diagnostics.push(Diagnostic::warning(
            "SY",
            format!("symbol '{}' is not defined in the library", name),
        ));
    }

    let rotation = match params.get(1) {
        None => None,
        Some(Param::Number(n)) if *n == 0.0 => None,
        Some(Param::Number(n)) => Some(Rotation::Degrees(*n)),
        Some(Param::Reference(attribute)) => Some(Rotation::Attribute(attribute.clone())),
        Some(Param::Str(_)) => {
            return Err(Error::BadParameter {
                command: "SY",
                detail: "rotation must be a number or an attribute reference".to_owned(),
            })
        }
    };

    let mut fragment = Fragment::new(RuleKind::PointSymbol);
    fragment.layout.icon = Some(name.to_owned());
    fragment.layout.icon_rotation = rotation;
    fragment.layout.placement = Some(Placement::Point);
    Ok(fragment)
}

// ──────────────────────────────────────────────
// Text commands
// ──────────────────────────────────────────────

/// TX(STRING, ...) -- literal or attribute-valued text label.
fn text_plain(
    params: &[Param],
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Fragment, Error> {
    let text = match params.first() {
        Some(Param::Str(s)) => TextValue::Literal(s.clone()),
        Some(Param::Reference(attribute)) => TextValue::Attribute(attribute.clone()),
        _ => {
            return Err(Error::BadParameter {
                command: "TX",
                detail: "expected a string or attribute reference".to_owned(),
            })
        }
    };
    text_fragment(text, &params[1..], ctx, diagnostics)
}

/// TE(FORMAT, ATTRIB, ...) -- text label produced by a format string
/// applied to one attribute.
fn text_formatted(
    params: &[Param],
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Fragment, Error> {
    let fmt = match params.first() {
        Some(Param::Str(s)) => s.as_str(),
        _ => {
            return Err(Error::BadParameter {
                command: "TE",
                detail: "expected a format string".to_owned(),
            })
        }
    };
    let attribute = name_param(params.get(1), "TE", "an attribute acronym")?;
    let text = format::format_attribute(fmt, attribute);
    text_fragment(text, &params[2..], ctx, diagnostics)
}

/// Shared TX/TE tail: justification, spacing, font, offsets, colour and
/// display group, all optional with the defaults of the format.
fn text_fragment(
    text: TextValue,
    rest: &[Param],
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Fragment, Error> {
    let hjust = code_param(rest.first(), 3);
    let vjust = code_param(rest.get(1), 1);
    let space = code_param(rest.get(2), 2);
    let chars = rest
        .get(3)
        .and_then(Param::token)
        .unwrap_or("15110");
    let xoffs = rest.get(4).and_then(Param::number).unwrap_or(0.0);
    let yoffs = rest.get(5).and_then(Param::number).unwrap_or(0.0);
    let colour = rest.get(6).and_then(Param::token).unwrap_or("CHBLK");
    let display_group = rest.get(7).map(display_group_text);

    let mut fragment = Fragment::new(RuleKind::Text);
    fragment.layout.text = Some(text);
    fragment.layout.text_anchor = Some(anchor(hjust, vjust));
    fragment.layout.text_font = Some(font_family(chars, diagnostics).to_owned());
    fragment.layout.text_size = Some(font_size(chars));
    fragment.layout.text_offset = Some([xoffs, yoffs]);
    // Word wrap caps line length at 8 units of body size.
    fragment.layout.text_max_width = (space == 3).then_some(8.0);
    fragment.layout.placement = Some(Placement::Point);
    fragment.layout.display_group = display_group;
    fragment.paint.text_colour = Some(colour_hex(colour, "TX", ctx, diagnostics));
    fragment.paint.text_halo_colour = Some("rgba(255, 255, 255, 0.5)".to_owned());
    fragment.paint.text_halo_width = Some(2.0);
    Ok(fragment)
}

/// Combine the HJUST (1 centre, 2 right, 3 left) and VJUST (1 bottom,
/// 2 centre, 3 top) codes into a single anchor. Out-of-range codes read
/// as the defaults.
fn anchor(hjust: i32, vjust: i32) -> Anchor {
    match (hjust, vjust) {
        (1, 2) => Anchor::Center,
        (1, 3) => Anchor::Top,
        (1, _) => Anchor::Bottom,
        (2, 2) => Anchor::Right,
        (2, 3) => Anchor::TopRight,
        (2, _) => Anchor::BottomRight,
        (_, 2) => Anchor::Left,
        (_, 3) => Anchor::TopLeft,
        _ => Anchor::BottomLeft,
    }
}

/// First three characters of the CHARS code select the family; the
/// closed table falls back to the medium upright face with a warning.
fn font_family(chars: &str, diagnostics: &mut Vec<Diagnostic>) -> &'static str {
    let code: String = chars.chars().take(3).collect();
    match code.as_str() {
        "141" => "Metropolis Light",
        "151" => "Metropolis Regular",
        "161" => "Metropolis Bold",
        "242" => "Metropolis Light Italic",
        _ => {
            diagnostics.push(Diagnostic::warning(
                "TX",
                format!("unknown font code '{}', using the default family", chars),
            ));
            "Metropolis Regular"
        }
    }
}

/// Remaining characters of the CHARS code are the body size in pica
/// points; non-numeric reads as the default 10.
fn font_size(chars: &str) -> u32 {
    chars
        .chars()
        .skip(3)
        .collect::<String>()
        .parse()
        .unwrap_or(10)
}

fn display_group_text(param: &Param) -> String {
    match param {
        Param::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
        Param::Number(n) => format!("{}", n),
        Param::Str(s) => s.clone(),
        Param::Reference(name) => name.clone(),
    }
}

// ──────────────────────────────────────────────
// Parameter and colour helpers
// ──────────────────────────────────────────────

fn name_param<'a>(
    param: Option<&'a Param>,
    command: &'static str,
    expected: &str,
) -> Result<&'a str, Error> {
    param
        .and_then(Param::token)
        .ok_or_else(|| Error::BadParameter {
            command,
            detail: format!("expected {}", expected),
        })
}

fn code_param(param: Option<&Param>, default: i32) -> i32 {
    param
        .and_then(Param::number)
        .map(|n| n as i32)
        .unwrap_or(default)
}

/// Resolve a colour token against the active palette. An unknown token
/// is a recoverable condition: warn and paint black rather than dropping
/// the fragment.
pub(crate) fn colour_hex(
    token: &str,
    command: &'static str,
    ctx: &Context<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    match ctx.palette.hex(token) {
        Some(hex) => hex.to_owned(),
        None => {
            diagnostics.push(Diagnostic::warning(
                command,
                format!(
                    "colour token '{}' is not in table '{}'",
                    token,
                    ctx.palette.name()
                ),
            ));
            "#000000".to_owned()
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::{cie_to_rgb, rgb_to_hex};
    use crate::model::{ColourEntry, ColourTable, RecordStatus};

    fn library() -> Library {
        let entries = vec![
            ("NODTA", 0.28, 0.31, 40.0),
            ("CHBLK", 0.28, 0.31, 0.0),
            ("CHMGD", 0.52, 0.29, 30.0),
            ("TRFCF", 0.26, 0.21, 55.0),
            ("DEPCN", 0.26, 0.29, 45.0),
        ];
        Library {
            colour_tables: vec![ColourTable {
                rcid: 1,
                status: RecordStatus::Nil,
                name: "DAY".to_owned(),
                entries: entries
                    .into_iter()
                    .map(|(token, x, y, luminance)| ColourEntry {
                        token: token.to_owned(),
                        x,
                        y,
                        luminance,
                        usage: String::new(),
                    })
                    .collect(),
            }],
            ..Library::default()
        }
    }

    fn run(input: &str) -> Result<(Vec<Fragment>, Vec<Diagnostic>), Error> {
        let library = library();
        let palette = Palette::from_table(&library.colour_tables[0]);
        let config = CompileConfig::default();
        let ctx = Context {
            library: &library,
            palette: &palette,
            config: &config,
        };
        let mut diagnostics = Vec::new();
        let fragments = compile_instructions(input, &ctx, &mut diagnostics)?;
        Ok((fragments, diagnostics))
    }

    #[test]
    fn ls_dash_line() {
        let (fragments, diagnostics) = run("LS(DASH,2,CHMGD)").unwrap();
        assert_eq!(fragments.len(), 1);
        let line = &fragments[0];
        assert_eq!(line.kind, RuleKind::Line);
        assert_eq!(line.paint.line_dash, Some(vec![3.6, 1.8]));
        assert_eq!(line.paint.line_width, Some(2.0));
        assert_eq!(
            line.paint.line_colour.as_deref(),
            Some(rgb_to_hex(cie_to_rgb(0.52, 0.29, 30.0)).as_str())
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn ls_solid_has_no_dash() {
        let (fragments, _) = run("LS(SOLD,1,CHBLK)").unwrap();
        assert_eq!(fragments[0].paint.line_dash, None);
    }

    #[test]
    fn ac_defaults_to_opaque() {
        let (fragments, _) = run("AC(TRFCF)").unwrap();
        assert_eq!(fragments[0].kind, RuleKind::Fill);
        assert_eq!(fragments[0].paint.fill_opacity, Some(1.0));
    }

    #[test]
    fn ac_transparency_codes_map_to_opacity() {
        let (fragments, _) = run("AC(TRFCF,3)").unwrap();
        assert_eq!(fragments[0].paint.fill_opacity, Some(0.25));
        let (fragments, _) = run("AC(TRFCF,7)").unwrap();
        assert_eq!(fragments[0].paint.fill_opacity, Some(1.0));
    }

    #[test]
    fn ap_emits_the_reference_even_when_unresolved() {
        let (fragments, diagnostics) = run("AP(DQUALA21)").unwrap();
        assert_eq!(fragments[0].paint.fill_pattern.as_deref(), Some("DQUALA21"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("DQUALA21"));
    }

    #[test]
    fn lc_emits_the_linestyle_reference() {
        let (fragments, _) = run("LC(ACHARE51)").unwrap();
        assert_eq!(fragments[0].kind, RuleKind::Line);
        assert_eq!(fragments[0].paint.line_pattern.as_deref(), Some("ACHARE51"));
    }

    #[test]
    fn sy_with_fixed_rotation() {
        let (fragments, _) = run("SY(FAIRWY52,135)").unwrap();
        let symbol = &fragments[0];
        assert_eq!(symbol.kind, RuleKind::PointSymbol);
        assert_eq!(symbol.layout.icon.as_deref(), Some("FAIRWY52"));
        assert_eq!(symbol.layout.icon_rotation, Some(Rotation::Degrees(135.0)));
    }

    #[test]
    fn sy_with_attribute_rotation() {
        let (fragments, _) = run("SY(EBBSTR01,ORIENT)").unwrap();
        assert_eq!(
            fragments[0].layout.icon_rotation,
            Some(Rotation::Attribute("ORIENT".to_owned()))
        );
    }

    #[test]
    fn sy_upright_leaves_rotation_unset() {
        let (fragments, _) = run("SY(BOYCAR01)").unwrap();
        assert_eq!(fragments[0].layout.icon_rotation, None);
        let (fragments, _) = run("SY(BOYCAR01,0)").unwrap();
        assert_eq!(fragments[0].layout.icon_rotation, None);
    }

    #[test]
    fn tx_full_parameter_list() {
        let (fragments, _) = run("TX(OBJNAM,1,2,3,'15110',0,0,CHBLK,26)").unwrap();
        let text = &fragments[0];
        assert_eq!(text.kind, RuleKind::Text);
        assert_eq!(
            text.layout.text,
            Some(TextValue::Attribute("OBJNAM".to_owned()))
        );
        assert_eq!(text.layout.text_anchor, Some(Anchor::Center));
        assert_eq!(text.layout.text_max_width, Some(8.0));
        assert_eq!(text.layout.text_font.as_deref(), Some("Metropolis Regular"));
        assert_eq!(text.layout.text_size, Some(10));
        assert_eq!(text.layout.text_offset, Some([0.0, 0.0]));
        assert_eq!(text.layout.display_group.as_deref(), Some("26"));
        assert_eq!(text.paint.text_colour.as_deref(), Some("#000000"));
    }

    #[test]
    fn tx_defaults_without_parameters() {
        let (fragments, _) = run("TX('Hello World')").unwrap();
        let text = &fragments[0];
        assert_eq!(
            text.layout.text,
            Some(TextValue::Literal("Hello World".to_owned()))
        );
        assert_eq!(text.layout.text_anchor, Some(Anchor::BottomLeft));
        assert_eq!(text.layout.text_max_width, None);
        assert_eq!(text.layout.text_offset, Some([0.0, 0.0]));
    }

    #[test]
    fn anchor_combinations() {
        let table = [
            (1, 1, Anchor::Bottom),
            (1, 2, Anchor::Center),
            (1, 3, Anchor::Top),
            (2, 1, Anchor::BottomRight),
            (2, 2, Anchor::Right),
            (2, 3, Anchor::TopRight),
            (3, 1, Anchor::BottomLeft),
            (3, 2, Anchor::Left),
            (3, 3, Anchor::TopLeft),
        ];
        for (hjust, vjust, expected) in table {
            assert_eq!(anchor(hjust, vjust), expected, "HJUST={hjust} VJUST={vjust}");
        }
    }

    #[test]
    fn font_sizes_follow_the_chars_code() {
        for (chars, expected) in [("1518", 8), ("15110", 10), ("15112", 12), ("15114", 14)] {
            let (fragments, _) = run(&format!("TX('Hello',1,1,1,'{chars}')")).unwrap();
            assert_eq!(fragments[0].layout.text_size, Some(expected), "{chars}");
        }
    }

    #[test]
    fn unknown_font_code_warns_and_uses_the_default_family() {
        let (fragments, diagnostics) = run("TX('Hello',1,1,1,'99910')").unwrap();
        assert_eq!(
            fragments[0].layout.text_font.as_deref(),
            Some("Metropolis Regular")
        );
        assert_eq!(fragments[0].layout.text_size, Some(10));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn te_concatenates_text_around_the_attribute() {
        let (fragments, _) = run("TE('Nr %s','OBJNAM',3,1,2,'15110',1,0,CHBLK,29)").unwrap();
        assert_eq!(
            fragments[0].layout.text,
            Some(TextValue::Concat(vec![
                TextValue::Literal("Nr ".to_owned()),
                TextValue::Attribute("OBJNAM".to_owned()),
            ]))
        );
        assert_eq!(fragments[0].layout.text_offset, Some([1.0, 0.0]));
    }

    #[test]
    fn te_numeric_format_fixture() {
        let (fragments, _) = run("TE('%03.0lf deg','ORIENT',1,1,2,'15110',0,-1,CHBLK,11)").unwrap();
        assert_eq!(
            fragments[0].layout.text,
            Some(TextValue::Concat(vec![
                TextValue::NumberFormat {
                    attribute: "ORIENT".to_owned(),
                    fraction_digits: 0,
                    floor: false,
                },
                TextValue::Literal(" deg".to_owned()),
            ]))
        );
    }

    #[test]
    fn unknown_command_fails_the_instruction_string() {
        assert_eq!(
            run("XX(FOO)").unwrap_err(),
            Error::UnknownCommand("XX".to_owned())
        );
    }

    #[test]
    fn unresolved_colour_token_warns_and_paints_black() {
        let (fragments, diagnostics) = run("AC(NOSUCH)").unwrap();
        assert_eq!(
            fragments[0].paint.fill_colour,
            Some(ColourValue::Hex("#000000".to_owned()))
        );
        assert_eq!(diagnostics.len(), 1);
    }
}
