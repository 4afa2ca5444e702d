pub mod array;
pub mod object;

pub use array::{ElementMatcher, find_element, intersection};
pub use object::{has_property, is_empty, is_not_empty, resolve_nested};
