mod fetch;
mod filename;
mod materialize;

pub use fetch::{ExternalTool, Fetcher, PartialOutput, ToolPaths};
pub use filename::{MediaMode, generate_filename, sanitize_title};
pub use materialize::materialize;
