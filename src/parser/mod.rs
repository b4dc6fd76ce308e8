pub mod play_parser;
pub mod parse_error;

pub use play_parser::{PlayParser, ScriptLine, classify};
pub use parse_error::{ParseError, ParseResult};
