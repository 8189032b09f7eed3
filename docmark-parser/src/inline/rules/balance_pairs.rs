//! Pair delimiter openers with closers for every delimiter list.
use rustc_hash::FxHashMap;

use crate::{
    Delimiter, InlineState,
    common::utils::{signed, unsigned},
};

/// Match closers to openers following the `CommonMark` emphasis rules,
/// including the rule of three. Runs in linear time: failed searches lower
/// a per-marker bound, and matched ranges are skipped through `jumps`.
#[allow(clippy::indexing_slicing)]
fn process(delimiters: &mut [Delimiter]) {
    if delimiters.is_empty() {
        return;
    }
    let mut openers_bottom: FxHashMap<u8, [isize; 6]> = FxHashMap::default();
    let mut header = 0usize;
    let mut last_token: isize = -2;
    let mut jumps: Vec<usize> = Vec::with_capacity(delimiters.len());

    for closer_index in 0..delimiters.len() {
        jumps.push(0);
        let closer = delimiters[closer_index];
        // Adjacent tokens with the same marker form one run.
        if delimiters[header].marker != closer.marker || last_token != signed(closer.token) - 1 {
            header = closer_index;
        }
        last_token = signed(closer.token);
        if !closer.close {
            continue;
        }

        let slot = usize::from(closer.open) * 3 + closer.length % 3;
        let bottoms = openers_bottom.entry(closer.marker).or_insert([-1; 6]);
        let min_opener = bottoms[slot];

        let mut opener_index = signed(header) - signed(jumps[header]) - 1;
        let mut new_min = opener_index;
        while opener_index > min_opener {
            let index = unsigned(opener_index);
            let opener = delimiters[index];
            if opener.marker == closer.marker && opener.open && opener.end.is_none() {
                let odd_match = (opener.close || closer.open)
                    && (opener.length + closer.length) % 3 == 0
                    && (opener.length % 3 != 0 || closer.length % 3 != 0);
                if !odd_match {
                    let last_jump = if index > 0 && !delimiters[index - 1].open {
                        jumps[index - 1] + 1
                    } else {
                        0
                    };
                    jumps[closer_index] = closer_index - index + last_jump;
                    jumps[index] = last_jump;
                    delimiters[closer_index].open = false;
                    delimiters[index].end = Some(closer_index);
                    delimiters[index].close = false;
                    new_min = -1;
                    last_token = -2;
                    break;
                }
            }
            opener_index -= signed(jumps[index]) + 1;
        }

        if new_min != -1 {
            let slot = usize::from(delimiters[closer_index].open) * 3 + closer.length % 3;
            openers_bottom.entry(closer.marker).or_insert([-1; 6])[slot] = new_min;
        }
    }
}

pub fn balance_pairs(state: &mut InlineState<'_>) {
    for list in &mut state.delimiter_lists {
        process(list);
    }
}
