pub mod constraint;
pub mod interval;
pub mod string_range;

pub use constraint::{Comparator, Constraint, Op, Range, Version};
pub use interval::parse_interval_range;
pub use string_range::{parse_range_spec, parse_string_list, parse_string_range, RangeSpec};
