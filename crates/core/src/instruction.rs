//! Symbology instruction parsing.
//!
//! An instruction string is a `;`-separated sequence of commands, each of
//! the shape `CC(p1,p2,...)` with a two-letter uppercase command code.
//! Parameters are classified here but never resolved: whether a bare
//! token names a colour, a graphic or a feature attribute is decided by
//! the command that consumes it.

use crate::error::Error;

/// One parsed parameter.
///
/// Quoted text never contains commas in the shipped library, so the
/// parameter list splits on `,` unconditionally.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Single-quoted literal, quotes stripped, no escape processing.
    Str(String),
    /// Integer or decimal literal, optional leading `-`.
    Number(f64),
    /// Bare token carried through for the consuming command to resolve.
    Reference(String),
}

impl Param {
    /// Numeric value, if this is a number literal.
    pub fn number(&self) -> Option<f64> {
        match self {
            Param::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Reference name, if this is a reference.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Param::Reference(name) => Some(name),
            _ => None,
        }
    }

    /// Token text for parameters that name something: a reference name
    /// or a quoted name, but never a number.
    pub fn token(&self) -> Option<&str> {
        match self {
            Param::Str(s) => Some(s),
            Param::Reference(name) => Some(name),
            Param::Number(_) => None,
        }
    }
}

/// One parsed command with its parameters in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Two-letter command code, e.g. "SY".
    pub command: String,
    pub params: Vec<Param>,
}

/// Split an instruction string into parsed commands.
///
/// Empty pieces between semicolons are dropped (trailing `;` is the
/// norm). Any piece that does not match the command grammar fails the
/// whole string with the offending text.
pub fn parse(input: &str) -> Result<Vec<Instruction>, Error> {
    input
        .split(';')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(parse_command)
        .collect()
}

fn parse_command(piece: &str) -> Result<Instruction, Error> {
    let err = || Error::InstructionSyntax(piece.to_owned());

    let mut chars = piece.chars();
    let command_ok = matches!(
        (chars.next(), chars.next()),
        (Some(a), Some(b)) if a.is_ascii_uppercase() && b.is_ascii_uppercase()
    );
    if !command_ok {
        return Err(err());
    }
    let (command, rest) = piece.split_at(2);
    let inner = rest
        .strip_prefix('(')
        .map(|r| r.strip_suffix(')').unwrap_or(r))
        .ok_or_else(err)?;
    if inner.is_empty() {
        return Err(err());
    }

    let params = inner.split(',').map(|p| parse_param(p.trim())).collect();
    Ok(Instruction {
        command: command.to_owned(),
        params,
    })
}

fn parse_param(value: &str) -> Param {
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return Param::Str(value[1..value.len() - 1].to_owned());
    }
    if is_numeric(value) {
        if let Ok(n) = value.parse() {
            return Param::Number(n);
        }
    }
    Param::Reference(value.to_owned())
}

fn is_numeric(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    if digits.is_empty() {
        return false;
    }
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();
    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.map_or(true, |f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_reference_parameter() {
        let parsed = parse("SY(ACHARE51)").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].command, "SY");
        assert_eq!(parsed[0].params, vec![Param::Reference("ACHARE51".to_owned())]);
    }

    #[test]
    fn mixed_parameter_kinds_keep_order() {
        let parsed = parse("TX(OBJNAM,1,2,3,'15110',0,0,CHBLK,26)").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(
            parsed[0].params,
            vec![
                Param::Reference("OBJNAM".to_owned()),
                Param::Number(1.0),
                Param::Number(2.0),
                Param::Number(3.0),
                Param::Str("15110".to_owned()),
                Param::Number(0.0),
                Param::Number(0.0),
                Param::Reference("CHBLK".to_owned()),
                Param::Number(26.0),
            ]
        );
    }

    #[test]
    fn semicolons_separate_commands_and_trailing_semicolon_is_fine() {
        let parsed = parse("AC(DEPMD);LS(SOLD,1,CHBLK);").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].command, "AC");
        assert_eq!(parsed[1].command, "LS");
    }

    #[test]
    fn negative_and_decimal_numbers() {
        let parsed = parse("TX('x',3,1,2,'15110',-1,0.5)").unwrap();
        assert_eq!(parsed[0].params[5], Param::Number(-1.0));
        assert_eq!(parsed[0].params[6], Param::Number(0.5));
    }

    #[test]
    fn almost_numeric_tokens_stay_references() {
        let parsed = parse("SY(1ABC)").unwrap();
        assert_eq!(parsed[0].params, vec![Param::Reference("1ABC".to_owned())]);
        let parsed = parse("SY(1.2.3)").unwrap();
        assert_eq!(parsed[0].params, vec![Param::Reference("1.2.3".to_owned())]);
    }

    #[test]
    fn bad_grammar_reports_the_offending_text() {
        for bad in ["SYM(ACHARE51)", "sy(X)", "SY", "SY()", "S(X)"] {
            match parse(bad) {
                Err(Error::InstructionSyntax(text)) => assert_eq!(text, bad),
                other => panic!("expected syntax error for {bad:?}, got {other:?}"),
            }
        }
    }
}
