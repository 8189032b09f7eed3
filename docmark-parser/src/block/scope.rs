//! Scoped overrides of block state for nested tokenization.
use std::{
    borrow::Cow,
    ops::{Deref, DerefMut},
};

use super::state::{BlockState, LineRecord, ParentType};

/// Guard that snapshots the shared block state and restores it on drop.
///
/// Container rules (lists, blockquotes, footnotes, definition and field lists,
/// admonitions) narrow `blk_indent`, `line_max` and `parent_type`, patch the
/// offsets of individual lines, and occasionally rewrite the source, before
/// running a nested tokenization. Everything they change through the guard is
/// put back when it goes out of scope, on every exit path. The cursor `line`,
/// the emitted tokens and `level` are outputs and are left alone.
pub struct ScopedState<'s, 'a> {
    state: &'s mut BlockState<'a>,
    saved: Saved<'a>,
}

/// Values put back when the guard drops.
struct Saved<'a> {
    blk_indent: isize,
    line_max: usize,
    parent_type: ParentType,
    tight: bool,
    dd_indent: isize,
    list_indent: isize,
    src: Option<Cow<'a, str>>,
    lines: Vec<(usize, LineRecord)>,
}

impl<'s, 'a> ScopedState<'s, 'a> {
    pub fn new(state: &'s mut BlockState<'a>) -> Self {
        let saved = Saved {
            blk_indent: state.blk_indent,
            line_max: state.line_max,
            parent_type: state.parent_type,
            tight: state.tight,
            dd_indent: state.dd_indent,
            list_indent: state.list_indent,
            src: None,
            lines: Vec::new(),
        };
        Self { state, saved }
    }

    /// Snapshot `line` before its offsets are patched. Repeated calls keep
    /// the first snapshot.
    pub fn save_line(&mut self, line: usize) {
        if !self.saved.lines.iter().any(|(saved, _)| *saved == line) {
            let record = self.state.lines.record(line);
            self.saved.lines.push((line, record));
        }
    }

    /// Patch the offsets of `line` for the lifetime of the guard.
    pub fn override_line(&mut self, line: usize, record: LineRecord) {
        self.save_line(line);
        self.state.lines.restore(line, record);
    }

    /// Replace the source buffer for the lifetime of the guard.
    pub fn replace_src(&mut self, src: String) {
        let previous = std::mem::replace(&mut self.state.src, Cow::Owned(src));
        if self.saved.src.is_none() {
            self.saved.src = Some(previous);
        }
    }
}

impl<'a> Deref for ScopedState<'_, 'a> {
    type Target = BlockState<'a>;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl DerefMut for ScopedState<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}

impl Drop for ScopedState<'_, '_> {
    fn drop(&mut self) {
        for (line, record) in self.saved.lines.drain(..).rev() {
            self.state.lines.restore(line, record);
        }
        if let Some(src) = self.saved.src.take() {
            self.state.src = src;
        }
        self.state.blk_indent = self.saved.blk_indent;
        self.state.line_max = self.saved.line_max;
        self.state.parent_type = self.saved.parent_type;
        self.state.tight = self.saved.tight;
        self.state.dd_indent = self.saved.dd_indent;
        self.state.list_indent = self.saved.list_indent;
    }
}
