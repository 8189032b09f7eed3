pub mod html_re;
pub mod link;
pub mod utils;
