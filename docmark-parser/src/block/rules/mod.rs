//! `CommonMark` block rules.
pub mod blockquote;
pub mod code;
pub mod fence;
pub mod heading;
pub mod hr;
pub mod html_block;
pub mod lheading;
pub mod list;
pub mod paragraph;
pub mod reference;
