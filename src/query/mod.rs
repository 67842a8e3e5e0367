pub mod dates;
pub mod matcher;
pub mod pattern;
pub mod term;

pub use dates::{ChronoResolver, DateResolver, ResolvedDate, parse_timestamp};
pub use matcher::{ComparePath, CompareOutcome, compare_tag, matches};
pub use pattern::Pattern;
pub use term::{Comparator, Query, QueryTerm, TagCriterion};
