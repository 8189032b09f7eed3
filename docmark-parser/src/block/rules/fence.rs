//! Fenced code blocks: ```` ``` ```` and `~~~`.
use std::sync::LazyLock;

use crate::{
    BlockState, Nesting,
    block::container::{Closing, ContainerMatcher, Marker},
};

static FENCE: LazyLock<ContainerMatcher> =
    LazyLock::new(|| ContainerMatcher::new(Marker::Run(vec![b'`', b'~']), 3, Closing::Marker));

pub fn fence(state: &mut BlockState<'_>, start_line: usize, end_line: usize, silent: bool) -> bool {
    let Some(opening) = FENCE.open(state, start_line, |opening| {
        !(opening.markup.starts_with('`') && opening.params.contains('`'))
    }) else {
        return false;
    };
    if silent {
        return true;
    }

    let close = FENCE.find_close(state, &opening, end_line);
    let content = ContainerMatcher::verbatim(state, &opening, &close);
    state.line = close.next_line();
    let line = state.line;
    let token = state.push("fence", "code", Nesting::SelfClosing);
    token.info = opening.params;
    token.content = content;
    token.markup = opening.markup;
    token.map = Some([start_line, line]);
    true
}
