//! Output formatting for CLI.

mod json;
mod text;

pub use json::{BatchOutput, JsonFormatter};
pub use text::TextFormatter;
