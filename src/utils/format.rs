//! printf-style formatting for configuration-supplied templates.
//!
//! Secret naming templates come from configuration (`"%s/%s"`, `"k_%s"`), so
//! they cannot go through `format!`. Only `%s`, `%v` and the `%%` escape are
//! supported; anything else is rejected up front rather than rendered as
//! garbage into a secret id.

use thiserror::Error;

/// Errors produced while rendering a template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("template '{template}' expects {expected} argument(s), got {actual}")]
    ArgumentCount { template: String, expected: usize, actual: usize },

    #[error("template '{template}' uses unsupported verb '%{verb}'")]
    UnsupportedVerb { template: String, verb: char },

    #[error("template '{template}' ends with a dangling '%'")]
    DanglingPercent { template: String },
}

#[derive(Debug, PartialEq, Eq)]
enum Piece<'a> {
    Literal(&'a str),
    Percent,
    Arg,
}

fn parse(template: &str) -> Result<Vec<Piece<'_>>, FormatError> {
    let mut pieces = Vec::new();
    let mut rest = template;

    while let Some(idx) = rest.find('%') {
        if idx > 0 {
            pieces.push(Piece::Literal(&rest[..idx]));
        }
        let mut chars = rest[idx + 1..].chars();
        match chars.next() {
            Some('s') | Some('v') => pieces.push(Piece::Arg),
            Some('%') => pieces.push(Piece::Percent),
            Some(verb) => {
                return Err(FormatError::UnsupportedVerb { template: template.to_string(), verb })
            }
            None => return Err(FormatError::DanglingPercent { template: template.to_string() }),
        }
        // every accepted verb is a single ASCII byte
        rest = &rest[idx + 2..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }

    Ok(pieces)
}

/// Number of `%s`/`%v` placeholders in `template`.
pub fn placeholder_count(template: &str) -> Result<usize, FormatError> {
    Ok(parse(template)?.iter().filter(|p| **p == Piece::Arg).count())
}

/// Check that `template` is well formed and takes exactly `expected` arguments.
pub fn validate_template(template: &str, expected: usize) -> Result<(), FormatError> {
    let actual = placeholder_count(template)?;
    if actual != expected {
        return Err(FormatError::ArgumentCount { template: template.to_string(), expected, actual });
    }
    Ok(())
}

/// Render `template`, substituting `args` in order.
///
/// ```
/// use servicekit::utils::format::sprintf;
///
/// assert_eq!(sprintf("%s/%s", &["svc", "dev1"]).unwrap(), "svc/dev1");
/// assert_eq!(sprintf("k_%s", &["x"]).unwrap(), "k_x");
/// assert_eq!(sprintf("100%% %s", &["done"]).unwrap(), "100% done");
/// ```
pub fn sprintf(template: &str, args: &[&str]) -> Result<String, FormatError> {
    let pieces = parse(template)?;
    let expected = pieces.iter().filter(|p| **p == Piece::Arg).count();
    if expected != args.len() {
        return Err(FormatError::ArgumentCount {
            template: template.to_string(),
            expected,
            actual: args.len(),
        });
    }

    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut args = args.iter();
    for piece in pieces {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Percent => out.push('%'),
            Piece::Arg => {
                if let Some(arg) = args.next() {
                    out.push_str(arg);
                }
            }
        }
    }

    Ok(out)
}
