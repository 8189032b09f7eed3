//! Property-based tests for the tokenizer and the HTML fragment parser.
//!
//! These check invariants that must hold for any input: the engines never
//! panic, silent validation has no side effects, containers close by marker
//! length, token streams stay balanced, and HTML fragments round-trip.

mod generators;
mod invariants;
