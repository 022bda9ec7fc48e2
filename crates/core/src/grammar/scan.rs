//! Whole-line matching shared by both grammars.

use plotspec_diagnostics::Span;

use super::lexer::Cursor;
use crate::error::SpecError;

/// Match `line` as one or more groups.
///
/// `group` tries to match a single group at the cursor, returning `Ok(None)`
/// when the input there is not a group. Groups are matched greedily from the
/// first non-blank character. Then:
///
/// * no group at the start → [`SpecError::InvalidSyntax`];
/// * text left over that contains another group anywhere →
///   [`SpecError::Ambiguous`];
/// * any other leftover text → [`SpecError::UnparsedRemainder`] quoting it.
///
/// Errors raised by `group` while matching the leading groups propagate.
/// While probing the leftover text they only mean "no group here".
pub fn match_line<G, F>(line: &str, mut group: F) -> Result<Vec<G>, SpecError>
where
    F: FnMut(&mut Cursor<'_>) -> Result<Option<G>, SpecError>,
{
    let mut cur = Cursor::new(line);
    cur.skip_ws();
    let start = cur.pos();

    let mut groups = Vec::new();
    loop {
        let mark = cur.pos();
        match group(&mut cur)? {
            Some(g) => {
                groups.push(g);
                cur.skip_ws();
            }
            None => {
                cur.reset(mark);
                break;
            }
        }
    }

    if groups.is_empty() {
        return Err(SpecError::InvalidSyntax {
            span: Some(Span::new(start, line.len())),
        });
    }
    if cur.at_end() {
        return Ok(groups);
    }

    let rest_start = cur.pos();
    for (offset, _) in line[rest_start..].char_indices() {
        let at = rest_start + offset;
        let mut ahead = Cursor::at(line, at);
        if let Ok(Some(_)) = group(&mut ahead) {
            return Err(SpecError::Ambiguous {
                text: line[at..ahead.pos()].to_string(),
                span: Some(Span::new(at, ahead.pos())),
            });
        }
    }

    let remainder = line[rest_start..].trim_end();
    Err(SpecError::UnparsedRemainder {
        remainder: remainder.to_string(),
        span: Some(Span::new(rest_start, rest_start + remainder.len())),
    })
}
