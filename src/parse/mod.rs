pub mod line;
pub mod outline_parser;
pub mod serializer;
pub mod tags;

pub use line::{LineKind, classify, indent_depth};
pub use outline_parser::{ParseOptions, parse_files, parse_text};
pub use serializer::{action_lines, project_header, serialize};
pub use tags::scan_tags;
