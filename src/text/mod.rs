//! Text collaborators: header blocks, readme files and Markdown.

pub mod headers;
pub mod markdown;
pub mod readme;

pub use headers::parse_file_headers;
pub use markdown::render_markdown;
pub use readme::{StructuredReadme, parse_readme};
