//! The sprintf-style text-format mini-language used by the TE command.
//!
//! A format string is literal text interspersed with specifiers of the
//! shape `%[width][.precision][l]{s|f}`. A `%` that does not open a valid
//! specifier is literal text.

use crate::rule::TextValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    /// `s`: substitute the attribute's raw value.
    Str,
    /// `f`: numeric formatting with a fixed number of fractional digits.
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormatToken {
    Text(String),
    Spec {
        width: Option<u32>,
        precision: Option<u32>,
        kind: SpecKind,
    },
}

/// Scan a format string into literal and specifier tokens.
pub fn parse_format(fmt: &str) -> Vec<FormatToken> {
    let chars: Vec<char> = fmt.chars().collect();
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            text.push(chars[i]);
            i += 1;
            continue;
        }
        match scan_spec(&chars[i + 1..]) {
            Some((consumed, width, precision, kind)) => {
                if !text.is_empty() {
                    tokens.push(FormatToken::Text(std::mem::take(&mut text)));
                }
                tokens.push(FormatToken::Spec {
                    width,
                    precision,
                    kind,
                });
                i += 1 + consumed;
            }
            None => {
                text.push('%');
                i += 1;
            }
        }
    }
    if !text.is_empty() {
        tokens.push(FormatToken::Text(text));
    }
    tokens
}

/// Scan `[width][.precision][l]{s|f}` after a `%`. Returns the consumed
/// length and the parsed parts, or `None` if this is not a specifier.
fn scan_spec(chars: &[char]) -> Option<(usize, Option<u32>, Option<u32>, SpecKind)> {
    let mut i = 0;
    let width = scan_number(chars, &mut i);
    let precision = if chars.get(i) == Some(&'.') {
        i += 1;
        Some(scan_number(chars, &mut i)?)
    } else {
        None
    };
    if chars.get(i) == Some(&'l') {
        i += 1;
    }
    let kind = match chars.get(i) {
        Some('s') => SpecKind::Str,
        Some('f') => SpecKind::Float,
        _ => return None,
    };
    Some((i + 1, width, precision, kind))
}

fn scan_number(chars: &[char], i: &mut usize) -> Option<u32> {
    let start = *i;
    while chars.get(*i).is_some_and(|c| c.is_ascii_digit()) {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    chars[start..*i].iter().collect::<String>().parse().ok()
}

/// Compile a format string applied to one attribute into a text value:
/// a single node when only one token exists, otherwise a concatenation
/// preserving left-to-right order. `f` specifiers default to zero
/// fractional digits.
pub fn format_attribute(fmt: &str, attribute: &str) -> TextValue {
    let mut parts: Vec<TextValue> = parse_format(fmt)
        .into_iter()
        .map(|token| match token {
            FormatToken::Text(text) => TextValue::Literal(text),
            FormatToken::Spec {
                kind: SpecKind::Str,
                ..
            } => TextValue::Attribute(attribute.to_owned()),
            FormatToken::Spec {
                kind: SpecKind::Float,
                precision,
                ..
            } => TextValue::NumberFormat {
                attribute: attribute.to_owned(),
                fraction_digits: precision.unwrap_or(0),
                floor: false,
            },
        })
        .collect();

    match parts.len() {
        0 => TextValue::Literal(String::new()),
        1 => parts.remove(0),
        _ => TextValue::Concat(parts),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
