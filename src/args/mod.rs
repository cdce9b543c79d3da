//! CLI argument types and parsing helpers.
mod cli;
pub(crate) mod parsers;
mod types;


pub use cli::BenchArgs;
pub use types::OutputFormat;

pub(crate) use parsers::{parse_form_entry, parse_header};
