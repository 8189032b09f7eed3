//! Runs of plain text up to the next byte some rule might care about.
use crate::InlineState;

/// Bytes that may start an inline construct, either built in or added by an
/// extension (`$` math, `{` attributes and substitutions, `^` footnotes).
pub(crate) fn is_terminator(byte: u8) -> bool {
    matches!(
        byte,
        b'\n'
            | b'!'
            | b'#'
            | b'$'
            | b'%'
            | b'&'
            | b'*'
            | b'+'
            | b'-'
            | b':'
            | b'<'
            | b'='
            | b'@'
            | b'['
            | b'\\'
            | b']'
            | b'^'
            | b'_'
            | b'`'
            | b'{'
            | b'}'
            | b'~'
    )
}

pub fn text(state: &mut InlineState<'_>, silent: bool) -> bool {
    let mut pos = state.pos;
    while pos < state.pos_max && !state.byte(pos).is_some_and(is_terminator) {
        pos += 1;
    }
    if pos == state.pos {
        return false;
    }
    if !silent {
        let text = state.slice(state.pos, pos);
        state.pending.push_str(text);
    }
    state.pos = pos;
    true
}
