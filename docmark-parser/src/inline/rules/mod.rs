//! `CommonMark` inline rules and post-processing passes.
pub mod autolink;
pub mod backticks;
pub mod balance_pairs;
pub mod emphasis;
pub mod entity;
pub mod escape;
pub mod fragments_join;
pub mod html_inline;
pub mod image;
pub mod link;
pub mod newline;
pub mod text;
